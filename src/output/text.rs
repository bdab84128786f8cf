//! Plain text report.
//!
//! ```text
//! 4f1c2a9 2
//!   /data/a.txt
//!   /data/b.txt
//! ```

use std::io::{self, Write};

use crate::duplicates::DuplicateGroup;

/// Text formatter over a slice of duplicate groups.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> TextOutput<'a> {
    /// Create a formatter for `groups`.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write one header line per group, then its paths indented by two spaces.
    ///
    /// Groups with fewer than two paths are skipped. Nothing is written when
    /// there are no duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups.iter().filter(|g| g.len() > 1) {
            writeln!(writer, "{} {}", group.short_id(), group.len())?;
            for path in &group.files {
                writeln!(writer, "  {}", path.display())?;
            }
        }
        writer.flush()
    }

    /// Render the report into a string.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
