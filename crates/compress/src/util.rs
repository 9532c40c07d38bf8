use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Compression {
    /// Full archive suffix, e.g. `.tar.gz`.
    #[inline]
    #[must_use]
    pub fn archive_extension(&self) -> &'static str {
        match self {
            Compression::None => ".tar",
            Compression::Bzip2 => ".tar.bz2",
            Compression::Gzip => ".tar.gz",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None, ".tar")]
    #[case(Compression::Bzip2, ".tar.bz2")]
    #[case(Compression::Gzip, ".tar.gz")]
    fn archive_extension(#[case] format: Compression, #[case] expected: &str) {
        assert_eq!(format.archive_extension(), expected);
        assert_eq!(Compression::from_path(format!("item{expected}")), format);
    }
}
