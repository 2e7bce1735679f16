//! Caller buffer access
//!
//! The store never touches caller memory directly; it goes through these
//! traits so that a buffer which cannot be accessed reports
//! [`ScullError::Fault`] at the copy instead of corrupting the store.
//! Plain byte slices and vectors never fault.

use crate::error::{Result, ScullError};

/// A caller buffer the store copies bytes out of (write path)
pub trait UserBuf {
    /// Bytes available in the buffer
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `dst` from the start of the caller buffer
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()>;
}

/// A caller buffer the store copies bytes into (read path)
pub trait UserBufMut {
    /// Room available in the buffer
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy all of `src` to the start of the caller buffer
    fn copy_to_user(&mut self, src: &[u8]) -> Result<()>;
}

impl UserBuf for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        let src = self.get(..dst.len()).ok_or_else(|| {
            ScullError::Fault(format!("read of {} bytes from {}-byte buffer", dst.len(), self.len()))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserBuf for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        self.as_slice().copy_from_user(dst)
    }
}

impl UserBufMut for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<()> {
        let room = self.len();
        let dst = self.get_mut(..src.len()).ok_or_else(|| {
            ScullError::Fault(format!("write of {} bytes into {}-byte buffer", src.len(), room))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserBufMut for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<()> {
        self.as_mut_slice().copy_to_user(src)
    }
}
