//! `.pgpass` credential-file detector.
//!
//! Unlike [`crate::simple_token::SimpleTokenDetector`] this secret kind
//! cannot be expressed as a single regex: fields are colon-separated
//! with `\:` and `\\` escapes, and a literal `*` password means "no
//! password stored here", not a secret.

use crate::detector::SecretDetector;
use sentryscan_formats::Secret;

/// Conservative bound on a single `.pgpass` line: five fields, each
/// realistically well under 100 bytes.
const MAX_PGPASS_LINE_LEN: u32 = 512;

pub struct PgpassDetector;

impl SecretDetector for PgpassDetector {
    fn max_secret_len(&self) -> u32 {
        MAX_PGPASS_LINE_LEN
    }

    fn detect(&self, data: &[u8]) -> Vec<(Secret, usize)> {
        let mut out = Vec::new();
        let mut offset = 0usize;

        for line in data.split_inclusive(|&b| b == b'\n') {
            let trimmed = trim_end_matches(line, |b| b == b'\n' || b == b'\r');
            let line_start = offset;
            offset += line.len();

            let content = trim_start(trimmed);
            if content.is_empty() || content[0] == b'#' {
                continue;
            }

            if let Some(fields) = parse_fields(content) {
                let [host, port, db, user, password] = fields;
                if password == "*" {
                    // A literal wildcard password is a placeholder,
                    // not a credential.
                    continue;
                }
                out.push((
                    Secret::PgpassEntry {
                        host,
                        port,
                        db,
                        user,
                        password,
                    },
                    line_start,
                ));
            }
        }

        out
    }
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    &bytes[i..]
}

fn trim_end_matches(bytes: &[u8], pred: impl Fn(u8) -> bool) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && pred(bytes[end - 1]) {
        end -= 1;
    }
    &bytes[..end]
}

/// Splits a `.pgpass` line into its five colon-separated fields,
/// honoring `\:` and `\\` escapes. Returns `None` if the line does not
/// have exactly five fields. Each field is lossily decoded to UTF-8
/// only after the byte-level split, so offsets into `data` stay exact
/// regardless of the line's encoding.
fn parse_fields(line: &[u8]) -> Option<[String; 5]> {
    let mut fields: Vec<Vec<u8>> = Vec::with_capacity(5);
    let mut current: Vec<u8> = Vec::new();
    let mut bytes = line.iter().copied().peekable();

    while let Some(c) = bytes.next() {
        if c == b'\\' {
            match bytes.peek() {
                Some(b':') => {
                    current.push(b':');
                    bytes.next();
                }
                Some(b'\\') => {
                    current.push(b'\\');
                    bytes.next();
                }
                _ => current.push(c),
            }
        } else if c == b':' && fields.len() < 4 {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    let fields: [Vec<u8>; 5] = fields.try_into().ok()?;
    Some(fields.map(|f| String::from_utf8_lossy(&f).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_entry() {
        let detector = PgpassDetector;
        let data = b"db.internal:5432:orders:svc_orders:hunter2\n";
        let matches = detector.detect(data);
        assert_eq!(matches.len(), 1);
        match &matches[0].0 {
            Secret::PgpassEntry {
                host,
                port,
                db,
                user,
                password,
            } => {
                assert_eq!(host, "db.internal");
                assert_eq!(port, "5432");
                assert_eq!(db, "orders");
                assert_eq!(user, "svc_orders");
                assert_eq!(password, "hunter2");
            }
            other => panic!("unexpected secret kind: {other:?}"),
        }
        assert_eq!(matches[0].1, 0);
    }

    #[test]
    fn honors_escaped_colons_in_the_password_field() {
        let detector = PgpassDetector;
        let data = b"db.internal:5432:orders:svc_orders:pa\\:ss\\\\word\n";
        let matches = detector.detect(data);
        assert_eq!(matches.len(), 1);
        match &matches[0].0 {
            Secret::PgpassEntry { password, .. } => assert_eq!(password, "pa:ss\\word"),
            other => panic!("unexpected secret kind: {other:?}"),
        }
    }

    #[test]
    fn wildcard_host_and_port_are_kept_but_wildcard_password_is_dropped() {
        let detector = PgpassDetector;
        let data = b"*:*:orders:svc_orders:s3cret\n*:*:orders:svc_orders:*\n";
        let matches = detector.detect(data);
        assert_eq!(matches.len(), 1);
        match &matches[0].0 {
            Secret::PgpassEntry { host, port, .. } => {
                assert_eq!(host, "*");
                assert_eq!(port, "*");
            }
            other => panic!("unexpected secret kind: {other:?}"),
        }
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let detector = PgpassDetector;
        let data = b"# a comment\n\ndb:5432:orders:user:pw\n";
        let matches = detector.detect(data);
        assert_eq!(matches.len(), 1);
    }
}
