use std::fs;
use std::path::Path;

/// Linux 电源信息目录
pub const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// 读取电池电量和外接电源状态
///
/// 目录不存在或没有电池时返回 `None`，外接电源以 `Mains`/`USB` 设备的 `online` 判断，
/// 找不到电源设备时退回到电池的 `status` 字段。
pub fn read_power_supply(dir: &Path) -> Option<(u8, bool)> {
    let entries = fs::read_dir(dir).ok()?;

    let mut battery: Option<(u8, Option<bool>)> = None;
    let mut mains_online: Option<bool> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(kind) = read_trimmed(&path.join("type")) else {
            continue;
        };

        match kind.as_str() {
            "Battery" => {
                if battery.is_some() {
                    continue;
                }
                let Some(capacity) = read_trimmed(&path.join("capacity"))
                    .and_then(|raw| parse_capacity(&raw))
                else {
                    continue;
                };
                let charging =
                    read_trimmed(&path.join("status")).map(|status| status_means_connected(&status));
                battery = Some((capacity, charging));
            }
            "Mains" | "USB" | "USB_C" => {
                if let Some(online) = read_trimmed(&path.join("online")) {
                    let online = online == "1";
                    mains_online = Some(mains_online.unwrap_or(false) || online);
                }
            }
            _ => {}
        }
    }

    let (capacity, charging) = battery?;
    let connected = mains_online.or(charging).unwrap_or(false);
    Some((capacity, connected))
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn parse_capacity(raw: &str) -> Option<u8> {
    raw.parse::<u32>().ok().map(|v| v.min(100) as u8)
}

fn status_means_connected(status: &str) -> bool {
    status != "Discharging"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn device(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), format!("{}\n", content)).unwrap();
        }
    }

    #[test]
    fn test_missing_dir_has_no_battery() {
        assert_eq!(read_power_supply(Path::new("/nonexistent/power_supply")), None);
    }

    #[test]
    fn test_desktop_without_battery() {
        let tmp = TempDir::new().unwrap();
        device(tmp.path(), "AC", &[("type", "Mains"), ("online", "1")]);
        assert_eq!(read_power_supply(tmp.path()), None);
    }

    #[test]
    fn test_battery_on_mains() {
        let tmp = TempDir::new().unwrap();
        device(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "87"), ("status", "Discharging")],
        );
        device(tmp.path(), "AC", &[("type", "Mains"), ("online", "1")]);
        assert_eq!(read_power_supply(tmp.path()), Some((87, true)));
    }

    #[test]
    fn test_battery_status_fallback() {
        let tmp = TempDir::new().unwrap();
        device(
            tmp.path(),
            "BAT1",
            &[("type", "Battery"), ("capacity", "15"), ("status", "Discharging")],
        );
        assert_eq!(read_power_supply(tmp.path()), Some((15, false)));

        fs::write(tmp.path().join("BAT1/status"), "Charging\n").unwrap();
        assert_eq!(read_power_supply(tmp.path()), Some((15, true)));
    }

    #[test]
    fn test_capacity_is_clamped() {
        assert_eq!(parse_capacity("104"), Some(100));
        assert_eq!(parse_capacity("abc"), None);
    }
}
