//! Compression of model files.

use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

const ZSTD_LEVEL: i32 = 19;

/// Compression format of a model stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Detects the format from the leading bytes of a stream.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else if head.starts_with(&ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Chooses the format from a file extension: `.gz`, `.zst` or `.zstd`.
    pub fn from_path<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Self::Gzip,
            Some("zst" | "zstd") => Self::Zstd,
            _ => Self::None,
        }
    }
}

/// Wraps a reader so that it yields decompressed bytes.
///
/// The format is detected from the magic bytes at the head of the stream; anything that is
/// neither gzip nor zstd is passed through unchanged.
///
/// # Errors
///
/// When `rdr` generates an error, it will be returned as is.
pub fn decoder<'a, R>(mut rdr: R) -> io::Result<Box<dyn Read + 'a>>
where
    R: Read + 'a,
{
    let mut head = [0; ZSTD_MAGIC.len()];
    let mut len = 0;
    while len < head.len() {
        match rdr.read(&mut head[len..]) {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => (),
            Err(e) => return Err(e),
        }
    }
    let compression = Compression::detect(&head[..len]);
    let rdr = BufReader::new(io::Cursor::new(head[..len].to_vec()).chain(rdr));
    tracing::debug!(?compression, "detected model compression");
    Ok(match compression {
        Compression::Gzip => Box::new(GzDecoder::new(rdr)),
        Compression::Zstd => Box::new(zstd::Decoder::with_buffer(rdr)?),
        Compression::None => Box::new(rdr),
    })
}

/// Sink that compresses everything written to it.
///
/// [`Encoder::finish`] must be called to write the trailer of the compressed stream.
pub enum Encoder<W>
where
    W: Write,
{
    Plain(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W> Encoder<W>
where
    W: Write,
{
    /// Creates a new encoder.
    ///
    /// # Errors
    ///
    /// When initializing the zstd context fails, the error will be returned.
    pub fn new(wtr: W, compression: Compression) -> io::Result<Self> {
        Ok(match compression {
            Compression::None => Self::Plain(wtr),
            Compression::Gzip => Self::Gzip(GzEncoder::new(wtr, flate2::Compression::best())),
            Compression::Zstd => Self::Zstd(zstd::Encoder::new(wtr, ZSTD_LEVEL)?),
        })
    }

    /// Finishes the stream and returns the inner writer.
    pub fn finish(self) -> io::Result<W> {
        let mut wtr = match self {
            Self::Plain(wtr) => wtr,
            Self::Gzip(e) => e.finish()?,
            Self::Zstd(e) => e.finish()?,
        };
        wtr.flush()?;
        Ok(wtr)
    }
}

impl<W> Write for Encoder<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
            Self::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
            Self::Zstd(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(data: &[u8], compression: Compression) -> Vec<u8> {
        let mut e = Encoder::new(vec![], compression).unwrap();
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn decompress(data: &[u8]) -> Vec<u8> {
        let mut buf = vec![];
        decoder(data).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_detect() {
        assert_eq!(Compression::Gzip, Compression::detect(&[0x1f, 0x8b, 0x08]));
        assert_eq!(
            Compression::Zstd,
            Compression::detect(&[0x28, 0xb5, 0x2f, 0xfd, 0x00])
        );
        assert_eq!(Compression::None, Compression::detect(b"{\"idf\": []}"));
        assert_eq!(Compression::None, Compression::detect(&[0x1f]));
        assert_eq!(Compression::None, Compression::detect(&[]));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Compression::Gzip, Compression::from_path("model.json.gz"));
        assert_eq!(Compression::Zstd, Compression::from_path("model.zst"));
        assert_eq!(Compression::Zstd, Compression::from_path("dir/model.zstd"));
        assert_eq!(Compression::None, Compression::from_path("model.json"));
        assert_eq!(Compression::None, Compression::from_path("model"));
    }

    #[test]
    fn test_gzip_stream() {
        let data = compress(b"{\"biases\": [0.5]}", Compression::Gzip);
        assert_eq!(Compression::Gzip, Compression::detect(&data));
        assert_eq!(b"{\"biases\": [0.5]}".to_vec(), decompress(&data));
    }

    #[test]
    fn test_zstd_stream() {
        let data = compress(b"{\"biases\": [0.5]}", Compression::Zstd);
        assert_eq!(Compression::Zstd, Compression::detect(&data));
        assert_eq!(b"{\"biases\": [0.5]}".to_vec(), decompress(&data));
    }

    #[test]
    fn test_plain_stream() {
        assert_eq!(b"{}".to_vec(), decompress(b"{}"));
        assert!(decompress(b"").is_empty());
    }

    // Hands out one byte per read.
    struct ByteByByte<'a>(&'a [u8]);

    impl Read for ByteByByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_short_reads() {
        for compression in [Compression::Gzip, Compression::Zstd] {
            let data = compress(b"{\"biases\": [0.5]}", compression);
            let mut buf = vec![];
            decoder(ByteByByte(&data))
                .unwrap()
                .read_to_end(&mut buf)
                .unwrap();
            assert_eq!(b"{\"biases\": [0.5]}".to_vec(), buf);
        }
    }

    #[test]
    fn test_short_plain_stream() {
        let mut buf = vec![];
        decoder(ByteByByte(b"[]")).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(b"[]".to_vec(), buf);
    }

    #[test]
    fn test_corrupt_gzip() {
        let mut buf = vec![];
        let result = decoder(&[0x1f, 0x8b, 0xff, 0xff][..])
            .unwrap()
            .read_to_end(&mut buf);
        assert!(result.is_err());
    }
}
