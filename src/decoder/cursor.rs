use crate::error::DecodeError;
use crate::symbol::Width;

/// Forward-only reader over the bytes of one instruction.
///
/// Every read is bounds checked; running off the end of the buffer yields
/// [`DecodeError::Truncated`] for the instruction being decoded.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    /// Offset of the first byte of the instruction
    start: usize,
    /// Offset the cursor is pointing to in the buffer
    curr_pt: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8], start: u16) -> Cursor<'a> {
        Cursor {
            bytes,
            start: start as usize,
            curr_pt: start as usize,
        }
    }

    /// Offset of the instruction being decoded.
    pub fn start(&self) -> u16 {
        self.start as u16
    }

    /// Amount of bytes consumed since the start of the instruction.
    pub fn consumed(&self) -> u16 {
        (self.curr_pt - self.start) as u16
    }

    pub fn next_u8(&mut self) -> Result<u8, DecodeError> {
        let Some(&byte) = self.bytes.get(self.curr_pt) else {
            return Err(DecodeError::Truncated {
                addr: self.start(),
                len: self.bytes.len(),
            });
        };
        self.curr_pt += 1;
        Ok(byte)
    }

    pub fn next_i8(&mut self) -> Result<i8, DecodeError> {
        self.next_u8().map(|byte| byte as i8)
    }

    /// Little-endian word.
    pub fn next_u16(&mut self) -> Result<u16, DecodeError> {
        let lo = self.next_u8()?;
        let hi = self.next_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn next_i16(&mut self) -> Result<i16, DecodeError> {
        self.next_u16().map(|word| word as i16)
    }

    /// Read an immediate of `width`, sign-extending a single byte to a word when
    /// `sign_extend` is set on a word-width operand.
    pub fn next_data(&mut self, width: Width, sign_extend: bool) -> Result<u16, DecodeError> {
        match (width, sign_extend) {
            (Width::Word, false) => self.next_u16(),
            (Width::Word, true) => Ok(self.next_i8()? as i16 as u16),
            (Width::Byte, _) => Ok(self.next_u8()? as u16),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let bytes = [0x34, 0x12, 0xff];
        let mut cursor = Cursor::new(&bytes, 0);
        assert_eq!(cursor.next_u16(), Ok(0x1234));
        assert_eq!(cursor.next_i8(), Ok(-1));
        assert_eq!(cursor.consumed(), 3);
    }

    #[test]
    fn sign_extends_only_word_data() {
        let bytes = [0xfe, 0xfe];
        assert_eq!(Cursor::new(&bytes, 0).next_data(Width::Word, true), Ok(0xfffe));
        assert_eq!(Cursor::new(&bytes, 0).next_data(Width::Word, false), Ok(0xfefe));
        assert_eq!(Cursor::new(&bytes, 0).next_data(Width::Byte, true), Ok(0x00fe));
    }

    #[test]
    fn reports_truncation_at_instruction_start() {
        let bytes = [0x00, 0xb8, 0x01];
        let mut cursor = Cursor::new(&bytes, 1);
        assert_eq!(cursor.next_u8(), Ok(0xb8));
        assert_eq!(
            cursor.next_u16(),
            Err(DecodeError::Truncated { addr: 1, len: 3 })
        );
    }
}
