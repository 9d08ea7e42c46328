//! Xcode-compatible globally-unique object identifiers ("gids"):
//! 24-hex-character strings encoding a user byte, a pid byte, a
//! sequence counter, a reference timestamp, and a per-process random
//! salt.

use crate::error::GidError;
use chrono::{DateTime, TimeZone, Utc};
use crc::{Crc, CRC_32_ISO_HDLC};
use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Xcode's reference epoch: 2001-01-01 00:00:00 UTC ("Core Data"/
/// "Cocoa" epoch), also used by `CFAbsoluteTime`.
fn reference_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).single().expect("valid constant date")
}

/// Converts a count of seconds since [`reference_epoch`] into a UTC
/// timestamp.
pub fn datetime_from_reftime(seconds: i64) -> DateTime<Utc> {
    reference_epoch() + chrono::Duration::seconds(seconds)
}

fn reftime_from_datetime(dt: DateTime<Utc>) -> i64 {
    (dt - reference_epoch()).num_seconds()
}

fn crc32_of(bytes: &[u8]) -> u32 {
    let mut digest = CRC32.digest();
    digest.update(bytes);
    digest.finalize()
}

/// The decomposed fields of a gid, as produced by [`gidfields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GidFields {
    pub gid: String,
    pub user_byte: u8,
    pub pid_byte: u8,
    pub seq: u16,
    pub reftime: u32,
    pub random32: u32,
}

impl GidFields {
    pub fn datetime(&self) -> DateTime<Utc> {
        datetime_from_reftime(self.reftime as i64)
    }
}

/// Decomposes a 24-hex-character gid into its constituent fields.
pub fn gidfields(gid: &str) -> Result<GidFields, GidError> {
    if gid.len() != 24 {
        return Err(GidError::BadLength { gid: gid.to_string(), len: gid.len() });
    }
    if !gid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GidError::NotHex { gid: gid.to_string() });
    }
    let byte = |range: std::ops::Range<usize>| u32::from_str_radix(&gid[range], 16).unwrap();
    Ok(GidFields {
        gid: gid.to_string(),
        user_byte: byte(0..2) as u8,
        pid_byte: byte(2..4) as u8,
        seq: byte(4..8) as u16,
        reftime: byte(8..16),
        random32: byte(16..24),
    })
}

/// Generates new gids compatible with Xcode's scheme.
///
/// The user-byte hash and the per-instance PRNG are deliberate
/// implementation choices documented in `DESIGN.md` (Open Questions 1
/// and 2) — Xcode's own internal algorithms for these are not
/// recoverable from available source, so this generator does not
/// attempt to bit-match Xcode's output, only its *shape*.
pub struct UniqueXcodeIdGenerator {
    user_byte: u8,
    pid_byte: u8,
    seq: u16,
    random32: u32,
    refdatefunc: Box<dyn FnMut() -> DateTime<Utc>>,
}

impl UniqueXcodeIdGenerator {
    pub fn new(username: Option<String>, pid: Option<u32>, refdatefunc: Option<Box<dyn FnMut() -> DateTime<Utc>>>) -> Self {
        let username = username.unwrap_or_else(|| whoami::username());
        let pid = pid.unwrap_or_else(std::process::id);

        let user_byte = (crc32_of(username.as_bytes()) & 0xFF) as u8;
        let pid_byte = (pid & 0xFF) as u8;
        let seq = (crc32_of(&pid.to_le_bytes()) & 0xFFFF) as u16;

        let mut refdatefunc = refdatefunc.unwrap_or_else(|| Box::new(Utc::now));
        let now = refdatefunc();
        let timebase = reftime_from_datetime(now) as u64;
        let mut rng = StdRng::seed_from_u64(timebase);
        let random32 = rng.next_u32();

        Self { user_byte, pid_byte, seq, random32, refdatefunc }
    }

    /// Generates the next gid: advances the sequence counter and
    /// samples the current reference time, but keeps `random32` fixed
    /// for the lifetime of this generator instance.
    pub fn generate(&mut self) -> String {
        self.seq = self.seq.wrapping_add(1);
        let now = (self.refdatefunc)();
        let reftime = reftime_from_datetime(now) as u32;
        format!("{:02X}{:02X}{:04X}{:08X}{:08X}", self.user_byte, self.pid_byte, self.seq, reftime, self.random32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GidDumpFormat {
    Text,
    Json,
}

/// Writes one line (or JSON object) per gid, describing its decoded
/// fields, to `sink`.
pub fn gidsplit(gids: &[String], format: GidDumpFormat, sink: &mut dyn std::io::Write) -> std::io::Result<()> {
    match format {
        GidDumpFormat::Text => {
            for gid in gids {
                match gidfields(gid) {
                    Ok(f) => writeln!(
                        sink,
                        "{}  user={:02X} pid={:02X} seq={:04X} random={:08X} {}",
                        f.datetime().format("%Y-%m-%d %H:%M:%S"),
                        f.user_byte,
                        f.pid_byte,
                        f.seq,
                        f.random32,
                        f.gid,
                    )?,
                    Err(e) => writeln!(sink, "{}: {}", gid, e)?,
                }
            }
        }
        GidDumpFormat::Json => {
            let mut entries = Vec::new();
            for gid in gids {
                if let Ok(f) = gidfields(gid) {
                    entries.push(serde_json::json!({
                        "gid": f.gid,
                        "date": f.datetime().to_rfc3339(),
                        "pid": f.pid_byte,
                        "user": f.user_byte,
                        "random": format!("{:08X}", f.random32),
                        "seq": f.seq,
                    }));
                }
            }
            writeln!(sink, "{}", serde_json::to_string_pretty(&entries)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_gid_has_expected_shape() {
        let mut gen = UniqueXcodeIdGenerator::new(Some("alice".into()), Some(4242), None);
        let gid = gen.generate();
        assert_eq!(gid.len(), 24);
        assert!(gid.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn sequential_calls_increment_seq_and_keep_random_stable() {
        let mut gen = UniqueXcodeIdGenerator::new(Some("alice".into()), Some(4242), None);
        let a = gen.generate();
        let b = gen.generate();
        let fa = gidfields(&a).unwrap();
        let fb = gidfields(&b).unwrap();
        assert_eq!(fb.seq, fa.seq.wrapping_add(1));
        assert_eq!(fa.random32, fb.random32);
        assert_eq!(fa.user_byte, fb.user_byte);
    }

    #[test]
    fn gidfields_rejects_bad_input() {
        assert!(matches!(gidfields("short"), Err(GidError::BadLength { .. })));
        assert!(matches!(gidfields("ZZZZZZZZZZZZZZZZZZZZZZZZ"), Err(GidError::NotHex { .. })));
    }

    #[test]
    fn gidfields_decodes_known_layout() {
        // user=AA pid=BB seq=0001 reftime=00000002 random=00000003
        let f = gidfields("AABB000100000002 00000003".replace(' ', "").as_str()).unwrap();
        assert_eq!(f.user_byte, 0xAA);
        assert_eq!(f.pid_byte, 0xBB);
        assert_eq!(f.seq, 1);
        assert_eq!(f.reftime, 2);
        assert_eq!(f.random32, 3);
    }

    #[test]
    fn different_usernames_different_user_byte_with_high_probability() {
        let g1 = UniqueXcodeIdGenerator::new(Some("alice".into()), Some(1), None);
        let g2 = UniqueXcodeIdGenerator::new(Some("bob".into()), Some(1), None);
        // Not a strict guarantee (hash collisions exist) but true for
        // this specific pair, pinning the algorithm's determinism.
        assert_ne!(g1.user_byte, g2.user_byte);
    }
}
