//! End-of-life Linux distro detector: reads `/etc/os-release`,
//! compares the release's published end-of-life
//! date against a clock, and reports `linux-end-of-life` unless an
//! Ubuntu Pro extended-support marker is present.

use chrono::NaiveDate;
use sentryscan_core::capabilities::Capabilities;
use sentryscan_core::{CancellationToken, Detector, Error, Plugin, ScanRoot};
use sentryscan_formats::{Advisory, Finding, FindingTarget, Inventory, PackageIndex, Severity};
use std::io::Read;

pub const REFERENCE: &str = "linux-end-of-life";
const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Presence of any of these files means the host is covered by
/// Ubuntu Pro's extended security maintenance, which pushes the
/// effective end-of-life date out past what the standard table
/// tracks; we treat it as "not end-of-life" rather than modeling the
/// extended dates themselves.
const UBUNTU_PRO_MARKERS: &[&str] = &[
    "/etc/apt/sources.list.d/ubuntu-esm-infra.list",
    "/etc/apt/sources.list.d/ubuntu-esm-apps.list",
];

/// `(id, version_id) -> end of standard support`. Deliberately small:
/// only the releases this detector is tested against.
const EOL_TABLE: &[(&str, &str, (i32, u32, u32))] = &[
    ("ubuntu", "18.04", (2023, 4, 30)),
    ("ubuntu", "20.04", (2025, 4, 30)),
    ("ubuntu", "22.04", (2027, 4, 30)),
    ("ubuntu", "24.04", (2029, 4, 30)),
    ("debian", "11", (2024, 8, 31)),
    ("debian", "12", (2026, 6, 30)),
];

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

pub struct LinuxEndOfLifeDetector {
    clock: Box<dyn Clock>,
}

impl Default for LinuxEndOfLifeDetector {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl LinuxEndOfLifeDetector {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }

    fn advisory() -> Advisory {
        Advisory {
            publisher: "SCALIBR".into(),
            reference: REFERENCE.into(),
            title: "End-of-life Linux distribution".into(),
            description: "This distribution release has passed its published end-of-life date and no longer receives security updates.".into(),
            recommendation: "Upgrade to a supported release or enroll in extended security maintenance.".into(),
            severity: Severity::Critical,
        }
    }
}

impl Plugin for LinuxEndOfLifeDetector {
    fn name(&self) -> &str {
        "linux-end-of-life"
    }

    fn version(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }
}

impl Detector for LinuxEndOfLifeDetector {
    fn required_extractors(&self) -> Vec<String> {
        Vec::new()
    }

    fn detected_finding(&self) -> Advisory {
        Self::advisory()
    }

    fn scan(
        &self,
        root: &ScanRoot,
        _index: &PackageIndex,
        _cancel: &CancellationToken,
    ) -> (Inventory, Option<Error>) {
        let mut inventory = Inventory::default();

        let mut reader = match root.fs.open(OS_RELEASE_PATH) {
            Ok(reader) => reader,
            Err(_) => return (inventory, None),
        };
        let mut buf = String::new();
        if let Err(e) = reader.read_to_string(&mut buf) {
            return (inventory, Some(Error::Io(e)));
        }
        let Some((id, version_id)) = parse_os_release(&buf) else {
            return (inventory, None);
        };

        let Some(eol) = lookup_eol(&id, &version_id) else {
            return (inventory, None);
        };

        if self.clock.today() <= eol {
            return (inventory, None);
        }

        if UBUNTU_PRO_MARKERS.iter().any(|p| root.fs.stat(p).is_ok()) {
            return (inventory, None);
        }

        inventory.findings.push(Finding {
            advisory: Self::advisory(),
            target: FindingTarget::Extra(format!("{id} {version_id} reached end of life on {eol}")),
        });
        (inventory, None)
    }
}

fn lookup_eol(id: &str, version_id: &str) -> Option<NaiveDate> {
    EOL_TABLE.iter().find_map(|(tid, tversion, (y, m, d))| {
        if *tid == id && *tversion == version_id {
            NaiveDate::from_ymd_opt(*y, *m, *d)
        } else {
            None
        }
    })
}

/// `/etc/os-release` is `KEY=value` lines; values may be
/// double-quoted. Only `ID` and `VERSION_ID` matter here.
fn parse_os_release(content: &str) -> Option<(String, String)> {
    let mut id = None;
    let mut version_id = None;
    for line in content.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"');
        match key {
            "ID" => id = Some(value.to_string()),
            "VERSION_ID" => version_id = Some(value.to_string()),
            _ => {}
        }
    }
    Some((id?, version_id?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentryscan_core::fs::InMemoryFileSystem;
    use std::sync::Arc;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    const UBUNTU_2204: &str =
        "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"22.04\"\nVERSION=\"22.04.3 LTS (Jammy Jellyfish)\"\n";

    fn clock_2030() -> Box<dyn Clock> {
        Box::new(FixedClock(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()))
    }

    #[test]
    fn reports_end_of_life_ubuntu_without_pro_marker() {
        let fs = InMemoryFileSystem::new([(
            OS_RELEASE_PATH.to_string(),
            UBUNTU_2204.as_bytes().to_vec(),
        )]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let detector = LinuxEndOfLifeDetector::new(clock_2030());
        let (inventory, err) = detector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());

        assert_eq!(inventory.findings.len(), 1);
        assert_eq!(inventory.findings[0].advisory.publisher, "SCALIBR");
        assert_eq!(inventory.findings[0].advisory.reference, REFERENCE);
        assert_eq!(inventory.findings[0].advisory.severity, Severity::Critical);
    }

    #[test]
    fn ubuntu_pro_marker_suppresses_the_finding() {
        let fs = InMemoryFileSystem::new([
            (OS_RELEASE_PATH.to_string(), UBUNTU_2204.as_bytes().to_vec()),
            (
                "/etc/apt/sources.list.d/ubuntu-esm-infra.list".to_string(),
                b"deb https://esm.ubuntu.com/infra/ubuntu jammy-infra-security main\n".to_vec(),
            ),
        ]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let detector = LinuxEndOfLifeDetector::new(clock_2030());
        let (inventory, err) = detector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());

        assert!(inventory.findings.is_empty());
    }

    #[test]
    fn release_still_within_support_window_is_not_reported() {
        let fs = InMemoryFileSystem::new([(
            OS_RELEASE_PATH.to_string(),
            UBUNTU_2204.as_bytes().to_vec(),
        )]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let clock = Box::new(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        let detector = LinuxEndOfLifeDetector::new(clock);
        let (inventory, err) = detector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());

        assert!(inventory.findings.is_empty());
    }

    #[test]
    fn unknown_release_is_not_reported() {
        let os_release = "NAME=\"Arch Linux\"\nID=arch\n";
        let fs = InMemoryFileSystem::new([(
            OS_RELEASE_PATH.to_string(),
            os_release.as_bytes().to_vec(),
        )]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let detector = LinuxEndOfLifeDetector::new(clock_2030());
        let (inventory, err) = detector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());

        assert!(inventory.findings.is_empty());
    }
}
