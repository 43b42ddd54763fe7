//! 挂单过期清扫器
//!
//! 固定间隔检查内存中的挂单，超过 2 小时的从内存和存储中删除。
//! 由 [`ParkedOrderStore::start_sweeper`](super::ParkedOrderStore::start_sweeper)
//! 注册为后台任务，随 store 的 dispose / drop 停止。
//!
//! 清扫会提交 redb 写事务，放在 blocking 线程池执行，不占用 async worker。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::store::StoreCore;

pub(super) struct ExpirySweeper {
    core: Arc<StoreCore>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub(super) fn new(core: Arc<StoreCore>, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            core,
            interval,
            shutdown,
        }
    }

    /// 主循环：每个 interval 清扫一次，收到关机信号退出
    pub(super) async fn run(self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Parked order sweeper started");

        // 第一次触发在一个 interval 之后，初始化时已经过滤过
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Parked order sweeper received shutdown signal");
                    return;
                }
                _ = ticker.tick() => {
                    let core = Arc::clone(&self.core);
                    match tokio::task::spawn_blocking(move || core.sweep_expired()).await {
                        Ok(0) => tracing::trace!("Sweep tick, nothing expired"),
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Parked order sweep failed"),
                    }
                }
            }
        }
    }
}
