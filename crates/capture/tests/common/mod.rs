#![allow(dead_code)]

use camera_capture::{CaptureDevice, Frame};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// What the next `grab` does.
#[derive(Debug, Clone)]
pub enum Step {
    /// Grab succeeds, retrieve yields this frame.
    Frame(Frame),
    /// Grab fails.
    GrabFail,
    /// Grab succeeds, retrieve scribbles into the buffer and fails.
    DecodeFail,
    /// Grab blocks for the duration, then yields the frame.
    Stall(Duration, Frame),
}

/// Test camera driven step by step through a channel.
///
/// `grab` blocks until the test sends the next [`Step`]. Once the sender is
/// dropped every grab fails.
pub struct ScriptedDevice {
    opened: bool,
    steps: Mutex<Receiver<Step>>,
    pending: Mutex<Option<Step>>,
    grab_times: Mutex<Vec<Instant>>,
    retrieves: AtomicUsize,
    sets: Mutex<Vec<(u32, f64)>>,
}

impl ScriptedDevice {
    pub fn new() -> (Self, Sender<Step>) {
        Self::build(true)
    }

    pub fn closed() -> (Self, Sender<Step>) {
        Self::build(false)
    }

    fn build(opened: bool) -> (Self, Sender<Step>) {
        let (tx, rx) = mpsc::channel();
        let device = Self {
            opened,
            steps: Mutex::new(rx),
            pending: Mutex::new(None),
            grab_times: Mutex::new(Vec::new()),
            retrieves: AtomicUsize::new(0),
            sets: Mutex::new(Vec::new()),
        };
        (device, tx)
    }

    pub fn grabs(&self) -> usize {
        self.grab_times().len()
    }

    pub fn grab_times(&self) -> Vec<Instant> {
        self.grab_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn retrieves(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<(u32, f64)> {
        self.sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CaptureDevice for ScriptedDevice {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn grab(&self) -> bool {
        self.grab_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());

        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();

        let step = match step {
            Ok(Step::GrabFail) | Err(_) => return false,
            Ok(Step::Stall(delay, frame)) => {
                std::thread::sleep(delay);
                Step::Frame(frame)
            }
            Ok(step) => step,
        };

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(step);
        true
    }

    fn retrieve(&self, frame: &mut Frame) -> bool {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        let step = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match step {
            Some(Step::Frame(src)) => {
                src.copy_to(frame);
                true
            }
            Some(Step::DecodeFail) => {
                frame.reshape(1, 1, 3).fill(0xEE);
                false
            }
            _ => false,
        }
    }

    fn set(&self, property_id: u32, value: f64) -> bool {
        self.sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((property_id, value));
        property_id < 100
    }
}

/// 16x16 RGB frame filled with `value`.
pub fn solid(value: u8) -> Frame {
    Frame::from_raw(16, 16, 3, vec![value; 16 * 16 * 3]).expect("valid geometry")
}

/// Poll `condition` every couple of milliseconds until it holds or `timeout` passes.
pub fn wait_for<F: FnMut() -> bool>(mut condition: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
