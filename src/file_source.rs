//! Read a raw logic-level sample stream from a file, one byte per
//! sample (`0` or `1`, or any nonzero value standing for high).

use std::io::{BufReader, Read, Seek};

use log::{debug, trace, warn};

use crate::block::{Block, BlockEOF, BlockName, BlockRet};
use crate::stream::{ReadStream, WriteStream};
use crate::Result;

/// Source block: reads raw samples from a file into a byte stream.
pub struct FileSource {
    filename: String,
    f: BufReader<std::fs::File>,
    repeat: bool,
    dst: WriteStream<u8>,
    eof: bool,
}

impl FileSource {
    /// Open `filename` for reading. If `repeat` is set, the file is
    /// rewound and read again on EOF instead of ending the stream.
    pub fn new(filename: &str, repeat: bool) -> Result<(Self, ReadStream<u8>)> {
        let f = BufReader::new(std::fs::File::open(filename)?);
        debug!("Opening source {filename}");
        let (dst, dst_r) = WriteStream::new();
        Ok((
            Self {
                filename: filename.to_string(),
                f,
                repeat,
                dst,
                eof: false,
            },
            dst_r,
        ))
    }
}

impl BlockName for FileSource {
    fn block_name(&self) -> &str {
        "FileSource"
    }
}

impl BlockEOF for FileSource {
    fn eof(&mut self) -> bool {
        self.eof
    }
}

impl Block for FileSource {
    fn work(&mut self) -> Result<BlockRet> {
        if self.eof {
            return Ok(BlockRet::EOF);
        }
        let mut o = self.dst.write_buf()?;
        let want = o.len();
        if want == 0 {
            trace!("FileSource: no space left in output stream");
            return Ok(BlockRet::Ok);
        }

        let mut buffer = vec![0u8; want];
        let n = self.f.read(&mut buffer)?;
        if n == 0 {
            if self.repeat {
                debug!("FileSource: rewinding {}", self.filename);
                self.f.get_mut().rewind()?;
                return Ok(BlockRet::Again);
            }
            warn!("EOF on {}", self.filename);
            self.eof = true;
            return Ok(BlockRet::EOF);
        }

        o.fill_from_slice(&buffer[..n]);
        o.produce(n, &[])?;
        trace!("FileSource: produced {n}");
        Ok(BlockRet::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_whole_file() -> Result<()> {
        let tmpd = tempfile::tempdir().unwrap();
        let tmpfn = tmpd.path().join("samples.bin");
        std::fs::write(&tmpfn, [1u8, 1, 0, 0, 1, 1, 1, 1]).unwrap();

        let (mut src, out) = FileSource::new(tmpfn.to_str().unwrap(), false)?;
        src.work()?;
        src.work()?;

        let (buf, _tags) = out.read_buf()?;
        assert_eq!(buf.slice()?, vec![1, 1, 0, 0, 1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileSource::new("/nonexistent/path/does-not-exist", false).is_err());
    }
}
