//! headcountd - classroom headcount daemon
//!
//! This daemon:
//! 1. Opens the configured camera (synthetic or V4L2), with fallback to the
//!    platform default device
//! 2. Polls the detection endpoint with one frame snapshot per cycle
//! 3. Reconciles counts with smoothing and failure backoff
//! 4. Renders the overlay surface for the latest box list
//! 5. Records each successful reading to the attendance backend
//!    (persistence failures are logged, never block the loop)

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use headcount::{
    AppState, AttendanceClient, CaptureSource, CycleOutcome, HeadcountConfig, HttpDetectClient,
    OverlaySurface, Poller, SyntheticBackend,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = HeadcountConfig::load()?;
    log::info!(
        "headcountd {} starting (detect={}, attendance={})",
        env!("CARGO_PKG_VERSION"),
        cfg.detect.url,
        cfg.attendance.base_url
    );

    let backend = build_backend(&cfg)?;
    let mut source = CaptureSource::new(backend);

    let devices = source.list_devices()?.to_vec();
    for (i, device) in devices.iter().enumerate() {
        log::info!("camera {}: {} ({})", i, device.label, device.id);
    }

    let mut state = AppState::new(cfg.detect.failure_threshold);
    let generation = source.open(cfg.camera.index)?;
    state.on_device_switch(generation);

    let client = HttpDetectClient::new(&cfg.detect.url, cfg.detect.request_timeout)?;
    let mut poller = Poller::new(client);

    let attendance = AttendanceClient::new(&cfg.attendance.base_url, cfg.detect.request_timeout)?;
    let mut overlay = OverlaySurface::new();

    let stop = poller.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("shutdown requested");
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("failed to install signal handler: {}", e))?;

    let mut last_health_log = Instant::now();
    let mut cycles = 0u64;

    log::info!(
        "polling every {}ms, failure threshold {}",
        cfg.detect.poll_interval.as_millis(),
        cfg.detect.failure_threshold
    );

    let interval = cfg.detect.poll_interval;
    poller.run(&mut source, &mut state, interval, |outcome, source, state| {
        cycles += 1;

        if *outcome == CycleOutcome::Applied {
            if let Some((width, height)) = source.native_dimensions() {
                overlay.render(state.boxes(), width, height);
            }
            if state.consecutive_errors() == 0 {
                if let Some(count) = state.display_count() {
                    if let Err(e) = attendance.record(count) {
                        log::warn!("attendance record failed: {:#}", e);
                    }
                }
            }
        }
        if let Some(status) = state.status() {
            log::info!("status: {}", status);
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "health: cycles={} count={:?} boxes={} errors={}",
                cycles,
                state.display_count(),
                state.boxes().len(),
                state.consecutive_errors()
            );
            last_health_log = Instant::now();
        }
    });

    source.close();
    log::info!("headcountd stopped after {} cycles", cycles);
    Ok(())
}

fn build_backend(cfg: &HeadcountConfig) -> Result<Box<dyn headcount::CaptureBackend>> {
    let device = &cfg.camera.device;
    if device.starts_with("stub://") {
        return Ok(Box::new(SyntheticBackend::new(
            device,
            cfg.camera.width,
            cfg.camera.height,
        )));
    }

    #[cfg(feature = "capture-v4l2")]
    if device.starts_with("/dev/") {
        return Ok(Box::new(headcount::capture::V4l2Backend::new(
            headcount::capture::V4l2Settings {
                width: cfg.camera.width,
                height: cfg.camera.height,
                target_fps: cfg.camera.target_fps,
            },
        )));
    }

    Err(anyhow!(
        "unsupported camera device '{}'; expected stub:// or /dev/ (feature capture-v4l2)",
        device
    ))
}
