//! Shared test infrastructure for alarm-controller integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use alarm_controller::{
    ClockError, CommandLine, Config, Controller, DEFAULT_MELODY, EdgeCell, Hardware, NetTime,
    NetTimeError, RotaryEncoder, Rtc, SerialPort, SettingsStore, StoreError, TextDisplay,
    TickSource, Timestamp,
};
use alarm_controller::{Buzzer, DISPLAY_COLS};

// ============================================================================
// Virtual monotonic clock
// ============================================================================

/// Tick source with manually advanced time. `wait_ms` advances virtual time
/// instead of spinning, so controller holds are instantaneous in tests.
pub struct TestTick {
    now_ms: Cell<u32>,
}

impl TestTick {
    pub fn new() -> Self {
        // start late enough that boot-time debounce suppression is history
        Self {
            now_ms: Cell::new(10_000),
        }
    }

    pub fn now(&self) -> u32 {
        self.now_ms.get()
    }

    pub fn advance(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get().wrapping_add(ms));
    }
}

impl TickSource for TestTick {
    fn ticks_ms(&self) -> u32 {
        self.now_ms.get()
    }

    fn wait_ms(&self, ms: u32) {
        self.advance(ms);
    }
}

// ============================================================================
// Mock RTC with settable calendar time
// ============================================================================

pub struct RtcState {
    pub now: Timestamp,
    pub fail_reads: bool,
    pub writes: Vec<Timestamp>,
}

#[derive(Clone)]
pub struct SharedRtc(pub Rc<RefCell<RtcState>>);

impl SharedRtc {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(RtcState {
            now: Timestamp::new(2025, 6, 25, 12, 0, 0).unwrap(),
            fail_reads: false,
            writes: Vec::new(),
        })))
    }

    /// Moves the wall clock to the given time of day.
    pub fn set_time(&self, hour: u8, minute: u8, second: u8) {
        let mut state = self.0.borrow_mut();
        state.now.hour = hour;
        state.now.minute = minute;
        state.now.second = second;
    }

    pub fn now(&self) -> Timestamp {
        self.0.borrow().now
    }

    pub fn writes(&self) -> Vec<Timestamp> {
        self.0.borrow().writes.clone()
    }
}

impl Rtc for SharedRtc {
    fn read(&mut self) -> Result<Timestamp, ClockError> {
        let state = self.0.borrow();
        if state.fail_reads {
            return Err(ClockError::ReadFailed);
        }
        Ok(state.now)
    }

    fn write(&mut self, timestamp: &Timestamp) -> Result<(), ClockError> {
        let mut state = self.0.borrow_mut();
        state.now = *timestamp;
        state.writes.push(*timestamp);
        Ok(())
    }
}

// ============================================================================
// Recording 20x4 display
// ============================================================================

pub struct DisplayState {
    pub rows: [String; 4],
    pub history: Vec<(u8, u8, String)>,
    pub clears: usize,
}

#[derive(Clone)]
pub struct SharedDisplay(pub Rc<RefCell<DisplayState>>);

impl SharedDisplay {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(DisplayState {
            rows: std::array::from_fn(|_| " ".repeat(DISPLAY_COLS)),
            history: Vec::new(),
            clears: 0,
        })))
    }

    /// Current contents of a row.
    pub fn row(&self, row: usize) -> String {
        self.0.borrow().rows[row].clone()
    }

    /// Whether any write so far contained the given text.
    pub fn ever_showed(&self, needle: &str) -> bool {
        self.0.borrow().history.iter().any(|(_, _, t)| t.contains(needle))
    }

    pub fn write_count(&self) -> usize {
        self.0.borrow().history.len()
    }
}

impl TextDisplay for SharedDisplay {
    fn clear(&mut self) {
        let mut state = self.0.borrow_mut();
        state.clears += 1;
        for row in &mut state.rows {
            *row = " ".repeat(DISPLAY_COLS);
        }
    }

    fn write_at(&mut self, col: u8, row: u8, text: &str) {
        let mut state = self.0.borrow_mut();
        let line = &mut state.rows[row as usize];
        let start = col as usize;
        for (i, c) in text.chars().enumerate() {
            let at = start + i;
            if at < DISPLAY_COLS {
                line.replace_range(at..at + 1, &c.to_string());
            }
        }
        state.history.push((col, row, text.to_string()));
    }
}

// ============================================================================
// Recording buzzer
// ============================================================================

pub struct BuzzerState {
    pub tone: Option<u16>,
    pub played: Vec<u16>,
}

#[derive(Clone)]
pub struct SharedBuzzer(pub Rc<RefCell<BuzzerState>>);

impl SharedBuzzer {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(BuzzerState {
            tone: None,
            played: Vec::new(),
        })))
    }

    pub fn tone(&self) -> Option<u16> {
        self.0.borrow().tone
    }

    pub fn played(&self) -> Vec<u16> {
        self.0.borrow().played.clone()
    }
}

impl Buzzer for SharedBuzzer {
    fn play(&mut self, frequency_hz: u16) {
        let mut state = self.0.borrow_mut();
        state.tone = Some(frequency_hz);
        state.played.push(frequency_hz);
    }

    fn silence(&mut self) {
        self.0.borrow_mut().tone = None;
    }
}

// ============================================================================
// Mock bounded rotary encoder
// ============================================================================

pub struct EncoderState {
    pub value: i32,
    pub bound: i32,
}

#[derive(Clone)]
pub struct SharedEncoder(pub Rc<RefCell<EncoderState>>);

impl SharedEncoder {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(EncoderState { value: 0, bound: 1 })))
    }

    /// Simulates turning the knob; the driver clamps to the active range.
    pub fn turn_to(&self, value: i32) {
        let mut state = self.0.borrow_mut();
        state.value = value.clamp(0, state.bound);
    }

    pub fn bound(&self) -> i32 {
        self.0.borrow().bound
    }
}

impl RotaryEncoder for SharedEncoder {
    fn value(&self) -> i32 {
        self.0.borrow().value
    }

    fn set_bound(&mut self, max_value: i32) {
        let mut state = self.0.borrow_mut();
        state.bound = max_value;
        state.value = state.value.clamp(0, max_value);
    }
}

// ============================================================================
// In-memory settings store (shareable across controller restarts)
// ============================================================================

#[derive(Clone)]
pub struct SharedStore(pub Rc<RefCell<BTreeMap<String, i32>>>);

impl SharedStore {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(BTreeMap::new())))
    }

    pub fn value(&self, key: &str) -> Option<i32> {
        self.0.borrow().get(key).copied()
    }
}

impl SettingsStore for SharedStore {
    fn get(&mut self, key: &str) -> Result<i32, StoreError> {
        self.0.borrow().get(key).copied().ok_or(StoreError::ReadFailed)
    }

    fn set(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        self.0.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// Scripted serial link
// ============================================================================

pub struct SerialState {
    pub incoming: VecDeque<String>,
    pub sent: Vec<String>,
}

#[derive(Clone)]
pub struct SharedSerial(pub Rc<RefCell<SerialState>>);

impl SharedSerial {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SerialState {
            incoming: VecDeque::new(),
            sent: Vec::new(),
        })))
    }

    /// Queues a line as if the companion application sent it.
    pub fn send_line(&self, line: &str) {
        self.0.borrow_mut().incoming.push_back(line.to_string());
    }

    pub fn sent(&self) -> Vec<String> {
        self.0.borrow().sent.clone()
    }
}

impl SerialPort for SharedSerial {
    fn poll_line(&mut self) -> Option<CommandLine> {
        let raw = self.0.borrow_mut().incoming.pop_front()?;
        let mut line = CommandLine::new();
        line.push_str(&raw).ok()?;
        Some(line)
    }

    fn write_line(&mut self, line: &str) {
        self.0.borrow_mut().sent.push(line.to_string());
    }
}

// ============================================================================
// Scripted network time source
// ============================================================================

#[derive(Clone)]
pub struct ScriptedNet(pub Rc<RefCell<VecDeque<Result<Timestamp, NetTimeError>>>>);

impl ScriptedNet {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(VecDeque::new())))
    }

    pub fn push(&self, result: Result<Timestamp, NetTimeError>) {
        self.0.borrow_mut().push_back(result);
    }
}

impl NetTime for ScriptedNet {
    fn fetch(&mut self) -> Result<Timestamp, NetTimeError> {
        self.0
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(NetTimeError::NoNetwork))
    }
}

// ============================================================================
// Bench: everything wired together
// ============================================================================

pub type TestController<'a> = Controller<
    'a,
    TestTick,
    SharedRtc,
    SharedDisplay,
    SharedBuzzer,
    SharedEncoder,
    SharedStore,
    SharedSerial,
    ScriptedNet,
>;

/// Owns the tick source, the edge cell and a handle to every mock; builds
/// controllers that share them. Building a second controller from the same
/// bench simulates a device restart with persisted settings intact.
pub struct Bench {
    pub tick: TestTick,
    pub edges: EdgeCell,
    pub rtc: SharedRtc,
    pub display: SharedDisplay,
    pub buzzer: SharedBuzzer,
    pub encoder: SharedEncoder,
    pub store: SharedStore,
    pub serial: SharedSerial,
    pub net: ScriptedNet,
}

impl Bench {
    pub fn new() -> Self {
        Self {
            tick: TestTick::new(),
            edges: EdgeCell::new(),
            rtc: SharedRtc::new(),
            display: SharedDisplay::new(),
            buzzer: SharedBuzzer::new(),
            encoder: SharedEncoder::new(),
            store: SharedStore::new(),
            serial: SharedSerial::new(),
            net: ScriptedNet::new(),
        }
    }

    pub fn controller(&self) -> TestController<'_> {
        Controller::new(
            Hardware {
                rtc: self.rtc.clone(),
                display: self.display.clone(),
                buzzer: self.buzzer.clone(),
                encoder: self.encoder.clone(),
                store: self.store.clone(),
                serial: self.serial.clone(),
                net_time: self.net.clone(),
            },
            &self.edges,
            &self.tick,
            DEFAULT_MELODY,
            Config::default(),
        )
    }

    /// Simulates one physical button press at the current time.
    pub fn press_button(&self) {
        self.edges.record(self.tick.now());
    }

    /// Advances monotonic time and runs one scheduler iteration. Moving the
    /// RTC wall clock is the test's own business.
    pub fn step(&self, controller: &mut TestController<'_>, ms: u32) {
        self.tick.advance(ms);
        controller.service();
    }
}
