//! `/proc/cgroups` parsing.

/// The 4th field value marking a controller as enabled.
const ENABLED_MARKER: &str = "1";

/// A cgroup controller listed by the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupController {
    /// Controller name (`cpu`, `memory`, `pids`, ...).
    pub name: String,
    /// Whether the kernel reports the controller as enabled.
    pub enabled: bool,
}

/// Parse the controller descriptor text.
///
/// Each line is split on whitespace; lines with fewer than four fields are
/// skipped. A controller is enabled iff its 4th field is exactly `1`, so the
/// `#subsys_name ... enabled` header parses as a disabled entry.
#[must_use]
pub fn parse_controllers(content: &str) -> Vec<CgroupController> {
    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            Some(CgroupController {
                name: fields[0].to_string(),
                enabled: fields[3] == ENABLED_MARKER,
            })
        })
        .collect()
}

/// Enabled controllers, in descriptor order.
#[must_use]
pub fn enabled_controllers(content: &str) -> Vec<CgroupController> {
    parse_controllers(content)
        .into_iter()
        .filter(|controller| controller.enabled)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const PROC_CGROUPS: &str = "\
#subsys_name\thierarchy\tnum_cgroups\tenabled
cpuset\t0\t1\t1
cpu\t0\t1\t1
memory\t0\t1\t0
pids\t0\t1\t1
";

    #[test]
    fn parse_real_layout() {
        let controllers = parse_controllers(PROC_CGROUPS);
        assert_eq!(controllers.len(), 5);
        assert_eq!(controllers[0].name, "#subsys_name");
        assert!(!controllers[0].enabled);
        assert!(!controllers[3].enabled);
    }

    #[test]
    fn enabled_skips_disabled_and_malformed() {
        let names: Vec<_> = enabled_controllers("cpu 0 1 1\nmemory 0 1 0\npids 0 1 1\nblkio 0\n")
            .into_iter()
            .map(|controller| controller.name)
            .collect();
        assert_eq!(names, ["cpu", "pids"]);
    }

    #[test]
    fn empty_input() {
        assert!(parse_controllers("").is_empty());
    }

    proptest! {
        #[test]
        fn short_lines_never_parse(fields in prop::collection::vec("[a-z0-9]{1,8}", 0..4)) {
            prop_assert!(parse_controllers(&fields.join(" ")).is_empty());
        }

        #[test]
        fn enabled_iff_fourth_field_is_one(name in "[a-z_]{1,12}", flag in "[0-9]{1,2}") {
            let controllers = parse_controllers(&format!("{name} 0 1 {flag}"));
            prop_assert_eq!(controllers.len(), 1);
            prop_assert_eq!(controllers[0].enabled, flag == "1");
        }
    }
}
