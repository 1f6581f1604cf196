//! Byte sinks the downloader can resume into.

use std::fs::File;
use std::io::{self, Cursor, Seek, SeekFrom, Write};

/// Where asset bytes go. Byte 0 of the asset is the destination's origin.
pub trait Destination: Write {
    /// Number of asset bytes already present, with the write cursor moved to the
    /// end of them. `None` when the destination cannot seek (pure stream).
    fn resume_offset(&mut self) -> io::Result<Option<u64>>;

    /// Discard everything written so far and move back to the origin.
    fn reset_to_origin(&mut self) -> io::Result<()>;
}

impl Destination for File {
    fn resume_offset(&mut self) -> io::Result<Option<u64>> {
        self.seek(SeekFrom::End(0)).map(Some)
    }

    fn reset_to_origin(&mut self) -> io::Result<()> {
        self.set_len(0)?;
        self.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl Destination for Cursor<Vec<u8>> {
    fn resume_offset(&mut self) -> io::Result<Option<u64>> {
        let len = self.get_ref().len() as u64;
        self.set_position(len);
        Ok(Some(len))
    }

    fn reset_to_origin(&mut self) -> io::Result<()> {
        self.get_mut().clear();
        self.set_position(0);
        Ok(())
    }
}

impl<D: Destination + ?Sized> Destination for &mut D {
    fn resume_offset(&mut self) -> io::Result<Option<u64>> {
        (**self).resume_offset()
    }

    fn reset_to_origin(&mut self) -> io::Result<()> {
        (**self).reset_to_origin()
    }
}

/// Wraps a plain writer (stdout, pipe, socket). Nothing can be resumed or rewound.
pub struct Unseekable<W>(pub W);

impl<W> Unseekable<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Write for Unseekable<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> Destination for Unseekable<W> {
    fn resume_offset(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }

    fn reset_to_origin(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "destination cannot be rewound",
        ))
    }
}
