//! Open types and open-type extension additions.
//!
//! An open type is an unconstrained, octet-aligned octet string carrying
//! the complete encoding of some other value. It is never empty on the
//! wire: an empty value goes out as the single octet `0x00`.

use crate::diag::log_err;
use crate::error::PerResult;
use crate::list::DList;
use crate::session::Session;
use crate::string::Octets;

const EMPTY_OPEN_TYPE: [u8; 1] = [0x00];

impl<'a> Session<'a> {
    /// Encodes `data` as an open type.
    ///
    /// Open types have no size constraint; a pending one is discarded.
    pub fn encode_open_type(&mut self, data: &[u8]) -> PerResult<()> {
        let data = if data.is_empty() {
            &EMPTY_OPEN_TYPE[..]
        } else {
            data
        };
        self.size_constraint = None;
        let result = self.encode_octet_string(data);
        log_err!(self, result);
        Ok(())
    }

    /// Decodes an open type. The contents are returned undecoded.
    pub fn decode_open_type(&mut self) -> PerResult<Octets<'a>> {
        self.size_constraint = None;
        let result = self.decode_octet_string();
        Ok(log_err!(self, result))
    }

    /// Writes one presence bit per extension addition.
    pub fn encode_open_type_ext_bits<T: AsRef<[u8]>>(
        &mut self,
        extensions: &DList<Option<T>>,
    ) -> PerResult<()> {
        for extension in extensions {
            log_err!(self, self.buffer.write_bit(extension.is_some()));
        }
        Ok(())
    }

    /// Encodes each present extension addition as an open type. Absent
    /// additions produce nothing.
    pub fn encode_open_type_ext<T: AsRef<[u8]>>(
        &mut self,
        extensions: &DList<Option<T>>,
    ) -> PerResult<()> {
        for data in extensions.iter().flatten() {
            log_err!(self, self.encode_open_type(data.as_ref()));
        }
        Ok(())
    }

    /// Reads `count` extension presence bits.
    pub fn decode_open_type_ext_bits(&mut self, count: usize) -> PerResult<Vec<bool>> {
        let mut present = Vec::with_capacity(count);
        for _ in 0..count {
            present.push(log_err!(self, self.buffer.read_bit()));
        }
        Ok(present)
    }

    /// Decodes one open type per set flag in `present`. The result holds
    /// one entry per flag, `None` where the addition is absent.
    pub fn decode_open_type_ext(
        &mut self,
        present: &[bool],
    ) -> PerResult<DList<Option<Octets<'a>>>> {
        let mut extensions = DList::new();
        for &is_present in present {
            let value = if is_present {
                Some(log_err!(self, self.decode_open_type()))
            } else {
                None
            };
            extensions.append(value);
        }
        Ok(extensions)
    }
}
