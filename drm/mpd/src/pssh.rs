use crate::error::PsshError;
use crate::system::SystemId;

/**
    Header fields of an ISOBMFF `pssh` box, as carried base64-encoded in a
    manifest's `cenc:pssh` element.

    Only the framing is decoded. The system-specific payload is left opaque,
    its length is reported in `data_len`.

    Layout:
      [0..4]    box_size (u32 BE)
      [4..8]    "pssh"
      [8]       version (0 or 1)
      [9..12]   flags
      [12..28]  system_id
      v1 only:  key_id_count (u32 BE), key_id_count * 16 bytes
      [..]      data_size (u32 BE), data
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsshHeader {
    pub version: u8,
    pub system_id: SystemId,
    pub key_ids: Vec<[u8; 16]>,
    pub data_len: usize,
}

impl PsshHeader {
    pub fn from_base64(pssh: &str) -> Result<Self, PsshError> {
        let bytes = data_encoding::BASE64
            .decode(pssh.trim().as_bytes())
            .map_err(|e| PsshError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self, PsshError> {
        let mut cursor = Cursor { input, offset: 0 };

        let box_size = cursor.u32("box_size")? as usize;
        if box_size > input.len() {
            return Err(malformed("box_size exceeds input length"));
        }
        if box_size < 32 {
            return Err(malformed("box_size too small for PSSH header"));
        }
        cursor.input = &input[..box_size];

        if cursor.take(4, "box_type")? != b"pssh" {
            return Err(malformed("box_type is not 'pssh'"));
        }

        let version = cursor.take(1, "version")?[0];
        if version > 1 {
            return Err(malformed(&format!("unsupported version {version}")));
        }
        cursor.take(3, "flags")?;

        let system_id = SystemId::from_bytes(cursor.array16("system_id")?);

        let mut key_ids = Vec::new();
        if version == 1 {
            let count = cursor.u32("key_id_count")? as usize;
            for _ in 0..count {
                key_ids.push(cursor.array16("key_ids")?);
            }
        }

        let data_len = cursor.u32("data_size")? as usize;
        cursor.take(data_len, "data")?;

        if cursor.offset != box_size {
            return Err(malformed(&format!(
                "trailing bytes: consumed {}, box_size {box_size}",
                cursor.offset
            )));
        }

        Ok(Self {
            version,
            system_id,
            key_ids,
            data_len,
        })
    }

    pub fn is_widevine(&self) -> bool {
        self.system_id == SystemId::Widevine
    }
}

struct Cursor<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], PsshError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| malformed(&format!("truncated {field}")))?;
        let slice = &self.input[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u32(&mut self, field: &str) -> Result<u32, PsshError> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn array16(&mut self, field: &str) -> Result<[u8; 16], PsshError> {
        let mut out = [0u8; 16];
        out.copy_from_slice(self.take(16, field)?);
        Ok(out)
    }
}

fn malformed(msg: &str) -> PsshError {
    PsshError::Malformed(msg.into())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::{PLAYREADY_SYSTEM_ID, WIDEVINE_SYSTEM_ID};
    use hex_literal::hex;

    /// Build a PSSH box; `key_ids` non-empty produces a v1 box.
    pub(crate) fn build_pssh(system_id: [u8; 16], key_ids: &[[u8; 16]], data: &[u8]) -> Vec<u8> {
        let version = u8::from(!key_ids.is_empty());
        let mut size = 32 + data.len();
        if version == 1 {
            size += 4 + key_ids.len() * 16;
        }
        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(&(size as u32).to_be_bytes());
        buf.extend_from_slice(b"pssh");
        buf.push(version);
        buf.extend_from_slice(&[0, 0, 0]);
        buf.extend_from_slice(&system_id);
        if version == 1 {
            buf.extend_from_slice(&(key_ids.len() as u32).to_be_bytes());
            for kid in key_ids {
                buf.extend_from_slice(kid);
            }
        }
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(data);
        buf
    }

    pub(crate) fn build_pssh_base64(system_id: [u8; 16], data: &[u8]) -> String {
        data_encoding::BASE64.encode(&build_pssh(system_id, &[], data))
    }

    #[test]
    fn widevine_v0() {
        let raw = build_pssh(WIDEVINE_SYSTEM_ID, &[], b"\x12\x10abcdefghijklmnop");
        let header = PsshHeader::from_bytes(&raw).unwrap();
        assert_eq!(header.version, 0);
        assert!(header.is_widevine());
        assert!(header.key_ids.is_empty());
        assert_eq!(header.data_len, 18);
    }

    #[test]
    fn playready_v1_with_key_ids() {
        let kid = hex!("2c4f0bba3ee44a9e8b6b2a3bd1e2f5a1");
        let raw = build_pssh(PLAYREADY_SYSTEM_ID, &[kid], b"");
        let header = PsshHeader::from_bytes(&raw).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.system_id, SystemId::PlayReady);
        assert_eq!(header.key_ids, vec![kid]);
        assert_eq!(header.data_len, 0);
    }

    #[test]
    fn from_base64_trims_whitespace() {
        let b64 = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"data");
        let header = PsshHeader::from_base64(&format!("\n  {b64}\n")).unwrap();
        assert!(header.is_widevine());
    }

    #[test]
    fn invalid_base64() {
        let err = PsshHeader::from_base64("not base64!").unwrap_err();
        assert!(matches!(err, PsshError::InvalidBase64(_)));
    }

    #[test]
    fn wrong_box_type() {
        let mut raw = build_pssh(WIDEVINE_SYSTEM_ID, &[], b"data");
        raw[4..8].copy_from_slice(b"moof");
        let err = PsshHeader::from_bytes(&raw).unwrap_err();
        assert!(matches!(err, PsshError::Malformed(_)));
    }

    #[test]
    fn truncated_input() {
        let err = PsshHeader::from_bytes(&[0u8; 3]).unwrap_err();
        assert!(matches!(err, PsshError::Malformed(_)));
    }

    #[test]
    fn data_size_overruns_box() {
        let mut raw = build_pssh(WIDEVINE_SYSTEM_ID, &[], b"data");
        let last = raw.len() - 4 - 4;
        raw[last..last + 4].copy_from_slice(&100u32.to_be_bytes());
        let err = PsshHeader::from_bytes(&raw).unwrap_err();
        assert_eq!(err, PsshError::Malformed("truncated data".into()));
    }
}
