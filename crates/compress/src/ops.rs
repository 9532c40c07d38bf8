//! Streaming codec operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::BzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{self, Read, Write};

// Payloads are mostly incompressible scan images.
const BZIP2_LEVEL: BzCompression = BzCompression::fast();
const GZIP_LEVEL: GzCompression = GzCompression::new(6);

/// A writer that compresses into `W` and must be [finished](Encoder::finish)
/// so trailing checksums and end-of-stream markers reach the output.
pub enum Encoder<W: Write> {
    None(W),
    Bzip2(BzEncoder<W>),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Flush the codec trailer and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        match self {
            Encoder::None(mut w) => {
                w.flush().or_raise(|| ErrorKind::Io)?;
                Ok(w)
            },
            Encoder::Bzip2(e) => e.finish().or_raise(|| ErrorKind::Io),
            Encoder::Gzip(e) => e.finish().or_raise(|| ErrorKind::Io),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::None(w) => w.write(buf),
            Encoder::Bzip2(e) => e.write(buf),
            Encoder::Gzip(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::None(w) => w.flush(),
            Encoder::Bzip2(e) => e.flush(),
            Encoder::Gzip(e) => e.flush(),
        }
    }
}

impl Compression {
    /// Wrap a reader with the matching decompression layer.
    ///
    /// ```
    /// use std::io::{Cursor, Read, Write};
    /// use sipkit_compress::Compression;
    ///
    /// let mut encoder = Compression::Gzip.wrap_writer(Vec::new());
    /// encoder.write_all(b"payload").unwrap();
    /// let compressed = encoder.finish().unwrap();
    ///
    /// let mut out = String::new();
    /// Compression::Gzip.wrap_reader(Cursor::new(compressed)).read_to_string(&mut out).unwrap();
    /// assert_eq!(out, "payload");
    /// ```
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
        }
    }

    /// Wrap a writer with the matching compression layer.
    pub fn wrap_writer<W: Write>(&self, writer: W) -> Encoder<W> {
        match self {
            Compression::None => Encoder::None(writer),
            Compression::Bzip2 => Encoder::Bzip2(BzEncoder::new(writer, BZIP2_LEVEL)),
            Compression::Gzip => Encoder::Gzip(GzEncoder::new(writer, GZIP_LEVEL)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;
    use std::io::{Cursor, Read, Write};

    fn compress(format: Compression, data: &[u8]) -> Vec<u8> {
        let mut encoder = format.wrap_writer(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn encoder_output_reads_back(#[case] format: Compression) {
        let original = b"AAAA_BBB123456_0001a.tif scanned at 600dpi";
        let compressed = compress(format, original);
        let mut decompressed = Vec::new();
        format.wrap_reader(Cursor::new(compressed)).read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[rstest]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn garbage_input_is_rejected(#[case] format: Compression) {
        let mut out = Vec::new();
        assert!(format.wrap_reader(Cursor::new(b"not compressed at all")).read_to_end(&mut out).is_err());
    }

    #[test]
    fn finished_output_carries_magic_bytes() {
        assert_eq!(Compression::from_magic_bytes(&compress(Compression::Gzip, b"")), Compression::Gzip);
        assert_eq!(Compression::from_magic_bytes(&compress(Compression::Bzip2, b"")), Compression::Bzip2);
    }
}
