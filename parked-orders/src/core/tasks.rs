//! 后台任务句柄
//!
//! 挂单过期清扫等定时任务通过 [`TaskHandle`] 启动和回收。
//!
//! - 任务内部通过 `CancellationToken` 监听停止信号
//! - `shutdown().await` 发送取消信号并等待任务退出
//! - 句柄被 drop 时（包括 panic 展开）自动发送取消信号，任务不会比所有者活得更久

use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owned handle to one spawned background task
pub struct TaskHandle {
    name: &'static str,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl TaskHandle {
    /// Spawn a task on the current tokio runtime
    ///
    /// `task` receives the cancellation token it must watch. Panics inside the
    /// task are caught and logged.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let future = task(shutdown.clone());
        let token = shutdown.clone();

        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) => {
                    if !token.is_cancelled() {
                        tracing::warn!(task = %name, "Background task completed unexpectedly");
                    }
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        panic = %panic_msg,
                        "Background task panicked"
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, "Spawned background task");

        Self {
            name,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Whether the task has exited (stopped, finished or panicked)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancel the task and wait for it to exit
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();

        let Some(handle) = self.handle.take() else {
            return;
        };

        match handle.await {
            Ok(()) => {
                tracing::debug!(task = %self.name, "Task stopped");
            }
            Err(e) if e.is_cancelled() => {
                tracing::debug!(task = %self.name, "Task cancelled");
            }
            Err(e) => {
                tracing::error!(task = %self.name, error = ?e, "Task panicked");
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
