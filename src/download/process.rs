//! 外部进程执行：合并 stdout/stderr 逐行转发，超时强制结束。
//!
//! 两个读取线程把输出按行送入同一个 channel，调用线程带截止时间消费，
//! 因此超时同时覆盖输出转发与等待退出两个阶段。

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::{debug, warn};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {}: {source}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },
    #[error("{0} pipe missing")]
    PipeMissing(&'static str),
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// 正常退出；被信号终止时退出码为 None
    Exited(Option<i32>),
    TimedOut,
}

pub struct ProcessSpec<'a> {
    pub program: &'a Path,
    pub args: &'a [OsString],
    pub work_dir: Option<&'a Path>,
    pub timeout: Duration,
}

/// 子进程句柄：离开作用域时若尚未回收则强制结束并回收。
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.child.kill() {
            warn!(target: "process", pid = self.child.id(), error = %err, "kill failed");
        }
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// 运行外部程序，每收到一行输出调用一次 `on_line`。
pub fn run_streaming<F>(spec: &ProcessSpec<'_>, mut on_line: F) -> Result<ProcessOutcome, ProcessError>
where
    F: FnMut(&str),
{
    let mut cmd = Command::new(spec.program);
    cmd.args(spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = spec.work_dir {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: spec.program.to_path_buf(),
        source,
    })?;
    let mut child = ChildGuard::new(child);
    debug!(target: "process", pid = child.child.id(), program = %spec.program.display(), "spawned");

    let stdout = child
        .child
        .stdout
        .take()
        .ok_or(ProcessError::PipeMissing("stdout"))?;
    let stderr = child
        .child
        .stderr
        .take()
        .ok_or(ProcessError::PipeMissing("stderr"))?;

    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    spawn_reader("stdout", stdout, tx.clone());
    spawn_reader("stderr", stderr, tx);

    let deadline = Instant::now() + spec.timeout;
    loop {
        // 持续有输出时 recv_deadline 不会超时，需要每行都检查截止时间
        if Instant::now() >= deadline {
            return Ok(time_out(&mut child, spec.timeout));
        }
        match rx.recv_deadline(deadline) {
            Ok(line) => on_line(&line),
            Err(RecvTimeoutError::Timeout) => return Ok(time_out(&mut child, spec.timeout)),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // 输出已关闭，剩余时间内等待退出
    loop {
        if let Some(status) = child.try_wait().map_err(ProcessError::Wait)? {
            debug!(target: "process", code = ?status.code(), "exited");
            return Ok(ProcessOutcome::Exited(status.code()));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(time_out(&mut child, spec.timeout));
        }
        thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
    }
}

fn time_out(child: &mut ChildGuard, timeout: Duration) -> ProcessOutcome {
    warn!(target: "process", timeout_secs = timeout.as_secs(), "timed out, killing");
    child.kill();
    ProcessOutcome::TimedOut
}

fn spawn_reader<R>(name: &'static str, pipe: R, tx: Sender<String>)
where
    R: Read + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(format!("relay-{name}"))
        .spawn(move || {
            let result = for_each_line(pipe, |line| tx.send(line).is_ok());
            if let Err(err) = result {
                debug!(target: "process", pipe = name, error = %err, "read failed");
            }
        });
    // 线程创建失败时 tx 随闭包一起丢弃，等价于该管道立即关闭
    if let Err(err) = spawned {
        warn!(target: "process", pipe = name, error = %err, "relay thread not started");
    }
}

/// 按 `\n`、`\r`、`\r\n` 切分输出，非 UTF-8 字节做有损替换。
/// `emit` 返回 false 时停止读取。
pub(crate) fn for_each_line<R, F>(reader: R, mut emit: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(String) -> bool,
{
    let mut reader = BufReader::new(reader);
    let mut pending: Vec<u8> = Vec::new();
    let mut skip_lf = false;

    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if buf.is_empty() {
            break;
        }
        let len = buf.len();
        for &byte in buf {
            if skip_lf {
                skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' | b'\r' => {
                    skip_lf = byte == b'\r';
                    let line = String::from_utf8_lossy(&pending).into_owned();
                    pending.clear();
                    if !emit(line) {
                        return Ok(());
                    }
                }
                _ => pending.push(byte),
            }
        }
        reader.consume(len);
    }

    if !pending.is_empty() {
        emit(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(())
}
