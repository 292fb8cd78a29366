//! Small shared helpers.

use std::fmt::Write as _;

/// Render `bytes` as a classic 16-per-line hex + ASCII dump for TRACE logs.
pub(crate) fn hexdump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", line * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, "{b:02x} ");
                }
                None => out.push_str("   "),
            }
            if i == 7 {
                out.push(' ');
            }
        }
        out.push(' ');
        for &b in chunk {
            out.push(if (0x20..0x7F).contains(&b) { b as char } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_lines_up() {
        let dump = hexdump(b"DxWiFi one-way uplink!");
        let mut lines = dump.lines();
        let first = lines.next().unwrap();
        assert!(first.starts_with("00000000  44 78 57 69 46 69 20 6f  6e 65 2d 77 61 79 20 75"));
        assert!(first.ends_with("DxWiFi one-way u"));
        let second = lines.next().unwrap();
        assert!(second.starts_with("00000010  70 6c 69 6e 6b 21"));
        assert!(second.ends_with("plink!"));
    }
}
