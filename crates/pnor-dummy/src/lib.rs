//! pnor-dummy - In-memory PNOR emulator for testing
//!
//! [`DummyPnor`] answers the same command lines as `pflash` against a
//! partition table held in memory, and [`RecordingMediator`] stands in for
//! the flash access mediator. Both write to a shared [`Journal`] so tests
//! can check the order in which the flash was touched.

use log::{debug, info};
use pnor_core::mediator::AccessMediator;
use pnor_core::tool::{ClearMode, FlashTool, ToolOutput};
use pnor_core::version::{SIGNED_HEADER_SIZE, SIGNED_MAGIC};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Status returned for commands the emulator does not understand
const STATUS_USAGE: i32 = 1;

/// Status returned for an injected failure
const STATUS_INJECTED: i32 = 2;

/// Something that happened to the emulated flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Mediator suspended
    Suspend,
    /// Mediator resumed
    Resume,
    /// Partition table listed
    List,
    /// Partition dumped to a file
    Read {
        /// Partition name
        name: String,
        /// Destination file
        dest: PathBuf,
    },
    /// Partition clear attempted
    Clear {
        /// Partition name
        name: String,
        /// Clear mode requested
        mode: ClearMode,
    },
}

/// Ordered event log shared between the emulator and the mediator
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn push(&self, event: Event) {
        lock(&self.0).push(event);
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<Event> {
        lock(&self.0).clone()
    }

    /// Number of events equal to `event`
    pub fn count(&self, event: &Event) -> usize {
        lock(&self.0).iter().filter(|e| *e == event).count()
    }
}

/// An emulated partition
#[derive(Debug, Clone)]
pub struct DummyPartition {
    /// Partition name
    pub name: String,
    /// Flag field as printed by the tool, e.g. `E--P--F-C-`
    pub flags: String,
    /// Partition contents
    pub data: Vec<u8>,
}

impl DummyPartition {
    /// Create a partition of `size` bytes filled with 0xFF
    pub fn new(name: &str, flags: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            flags: flags.to_string(),
            data: vec![0xFF; size],
        }
    }
}

struct State {
    partitions: Vec<DummyPartition>,
    failing_clears: HashSet<String>,
    read_status: i32,
    list_status: i32,
}

/// In-memory PNOR answering `pflash` command lines
pub struct DummyPnor {
    state: Mutex<State>,
    journal: Journal,
}

impl DummyPnor {
    /// Create an emulator with an empty partition table
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                partitions: Vec::new(),
                failing_clears: HashSet::new(),
                read_status: 0,
                list_status: 0,
            }),
            journal: Journal::new(),
        }
    }

    /// A typical OpenPOWER partition table with a blank VERSION partition
    pub fn standard() -> Self {
        Self::new()
            .with_partition(DummyPartition::new("part", "----R-----", 0x2000))
            .with_partition(DummyPartition::new("HBEL", "E-----F-C-", 0x24000))
            .with_partition(DummyPartition::new("GUARD", "E--P--F-C-", 0x5000))
            .with_partition(DummyPartition::new("NVRAM", "---P--F---", 0x90000))
            .with_partition(DummyPartition::new("SECBOOT", "E--P------", 0x24000))
            .with_partition(DummyPartition::new("MVPD", "E--P--F-C-", 0x90000))
            .with_partition(DummyPartition {
                name: "VERSION".to_string(),
                flags: "-----RV---".to_string(),
                data: vec![0; 0x1000],
            })
    }

    /// Add a partition at the end of the table
    pub fn with_partition(self, part: DummyPartition) -> Self {
        self.state().partitions.push(part);
        self
    }

    /// Replace the contents of a partition, adding it if missing
    pub fn set_data(&self, name: &str, data: &[u8]) {
        let mut state = self.state();
        match state.partitions.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data.to_vec(),
            None => state.partitions.push(DummyPartition {
                name: name.to_string(),
                flags: "----------".to_string(),
                data: data.to_vec(),
            }),
        }
    }

    /// Store NUL-terminated version text in the VERSION partition
    pub fn set_version(&self, text: &str) {
        self.set_data("VERSION", &version_image(text));
    }

    /// Store version text behind a signed container header
    pub fn set_signed_version(&self, text: &str) {
        self.set_data("VERSION", &signed_version_image(text));
    }

    /// Make clears of `name` fail
    pub fn fail_clear(&self, name: &str) {
        self.state().failing_clears.insert(name.to_string());
    }

    /// Make partition reads return `status`
    pub fn fail_reads(&self, status: i32) {
        self.state().read_status = status;
    }

    /// Make the partition listing return `status` (output is still produced)
    pub fn fail_listing(&self, status: i32) {
        self.state().list_status = status;
    }

    /// Contents of a partition
    pub fn data(&self, name: &str) -> Option<Vec<u8>> {
        self.state()
            .partitions
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.clone())
    }

    /// The journal this emulator writes to
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Format the partition table the way the tool prints it
    pub fn listing(&self) -> String {
        let state = self.state();
        let mut out = String::from("TOC@0x00000000 Partitions:\n-----------\n");
        let mut offset = 0usize;
        for (i, part) in state.partitions.iter().enumerate() {
            let end = offset + part.data.len();
            out.push_str(&format!(
                "ID={:02} {:>15} 0x{:08x}..0x{:08x} (actual=0x{:08x}) [{}]\n",
                i,
                part.name,
                offset,
                end,
                part.data.len(),
                part.flags
            ));
            offset = end;
        }
        out
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn read(&self, name: &str, dest: &str) -> ToolOutput {
        self.journal.push(Event::Read {
            name: name.to_string(),
            dest: PathBuf::from(dest),
        });

        let state = self.state();
        if state.read_status != 0 {
            return ToolOutput::failed(state.read_status);
        }
        let Some(part) = state.partitions.iter().find(|p| p.name == name) else {
            debug!("dummy: no partition {}", name);
            return ToolOutput::failed(STATUS_USAGE);
        };
        match fs::write(dest, &part.data) {
            Ok(()) => ToolOutput::ok(""),
            Err(e) => {
                debug!("dummy: failed to write {}: {}", dest, e);
                ToolOutput::failed(STATUS_USAGE)
            }
        }
    }

    fn clear(&self, name: &str, mode: ClearMode) -> ToolOutput {
        self.journal.push(Event::Clear {
            name: name.to_string(),
            mode,
        });

        let mut state = self.state();
        if state.failing_clears.contains(name) {
            return ToolOutput::failed(STATUS_INJECTED);
        }
        let Some(part) = state.partitions.iter_mut().find(|p| p.name == name) else {
            return ToolOutput::failed(STATUS_USAGE);
        };
        let fill = match mode {
            ClearMode::Ecc => 0x00,
            ClearMode::Erase => 0xFF,
        };
        part.data.fill(fill);
        ToolOutput::ok("")
    }
}

impl Default for DummyPnor {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashTool for DummyPnor {
    fn name(&self) -> &str {
        "dummy"
    }

    fn run(&self, args: &[&str]) -> pnor_core::Result<ToolOutput> {
        debug!("dummy: {:?}", args);
        let out = match args {
            ["-i"] => {
                self.journal.push(Event::List);
                let status = self.state().list_status;
                ToolOutput {
                    status,
                    output: self.listing(),
                }
            }
            ["-P", name, "-r", dest] => self.read(name, dest),
            ["-P", name, "-c", "-f"] => self.clear(name, ClearMode::Ecc),
            ["-P", name, "-e", "-f"] => self.clear(name, ClearMode::Erase),
            _ => ToolOutput::failed(STATUS_USAGE),
        };
        Ok(out)
    }
}

/// Mediator that logs and journals suspend/resume calls
#[derive(Debug, Clone, Default)]
pub struct RecordingMediator {
    journal: Journal,
}

impl RecordingMediator {
    /// Record into `journal`
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl AccessMediator for RecordingMediator {
    fn suspend(&self) {
        info!("dummy: mediator suspended");
        self.journal.push(Event::Suspend);
    }

    fn resume(&self) {
        info!("dummy: mediator resumed");
        self.journal.push(Event::Resume);
    }
}

/// Version partition image holding NUL-terminated `text`
pub fn version_image(text: &str) -> Vec<u8> {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    data
}

/// Version partition image with a signed container header in front
pub fn signed_version_image(text: &str) -> Vec<u8> {
    let mut data = vec![0u8; SIGNED_HEADER_SIZE];
    data[..SIGNED_MAGIC.len()].copy_from_slice(&SIGNED_MAGIC);
    data.extend_from_slice(&version_image(text));
    data
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the state from the others
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
