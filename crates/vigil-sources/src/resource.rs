use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sysinfo::{Disks, System};
use tracing::debug;
use vigil_types::ResourceSnapshot;

use crate::battery::{read_power_supply, POWER_SUPPLY_DIR};
use crate::SourceError;

/// 主机资源采样器
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<ResourceSnapshot, SourceError>;
}

struct SamplerState {
    system: System,
    disks: Disks,
}

/// 基于 sysinfo 的采样器
///
/// `System` 在多次采样间复用，CPU 使用率是相邻两次采样之间的增量。
pub struct SysinfoSampler {
    state: Arc<Mutex<SamplerState>>,
    power_supply_dir: PathBuf,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self::with_power_supply_dir(POWER_SUPPLY_DIR)
    }

    pub fn with_power_supply_dir(dir: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        // 首次刷新作为 CPU 增量基线
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            state: Arc::new(Mutex::new(SamplerState {
                system,
                disks: Disks::new_with_refreshed_list(),
            })),
            power_supply_dir: dir.into(),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceSampler for SysinfoSampler {
    async fn sample(&self) -> Result<ResourceSnapshot, SourceError> {
        let state = self.state.clone();
        let power_dir = self.power_supply_dir.clone();

        let snapshot = tokio::task::spawn_blocking(move || {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            let SamplerState { system, disks } = &mut *state;

            system.refresh_cpu();
            system.refresh_memory();
            disks.refresh_list();

            let cpu = system.global_cpu_info().cpu_usage() as f64;

            let ram_total = system.total_memory();
            let ram_used = ram_total.saturating_sub(system.available_memory());

            let (disk_used, disk_total) = disks
                .list()
                .iter()
                .filter(|disk| disk.total_space() > 0)
                .fold((0u64, 0u64), |(used, total), disk| {
                    (
                        used + disk.total_space().saturating_sub(disk.available_space()),
                        total + disk.total_space(),
                    )
                });

            let snapshot =
                ResourceSnapshot::new(cpu, (ram_used, ram_total), (disk_used, disk_total));
            match read_power_supply(&power_dir) {
                Some((pct, connected)) => snapshot.with_battery(pct, connected),
                None => snapshot,
            }
        })
        .await?;

        debug!(
            "Resource sample: CPU={:.1}%, RAM={:.1}%, Disk={:.1}%",
            snapshot.cpu_usage_pct, snapshot.ram_usage_pct, snapshot.disk_usage_pct
        );

        Ok(snapshot)
    }
}
