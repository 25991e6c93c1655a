use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sysmon::eventlog::MemoryEventLog;
use sysmon::system::collector::Collector;
use sysmon::system::cpu::CpuSampler;
use sysmon::system::error::SampleError;
use sysmon::system::procfs::ProcFs;
use sysmon::system::ranking::top_n;

struct FakeRoot {
    path: PathBuf,
}

impl FakeRoot {
    fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!("sysmon_it_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        FakeRoot { path }
    }

    fn file(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    fn process(&self, pid: u32, comm: &str, utime: u64, stime: u64) -> &Self {
        self.file(&format!("{pid}/comm"), &format!("{comm}\n")).file(
            &format!("{pid}/stat"),
            &format!("{pid} ({comm}) S 1 {pid} {pid} 0 -1 0 0 0 0 0 {utime} {stime} 0 0 20 0 1 0"),
        )
    }

    fn source(&self) -> ProcFs {
        ProcFs::new(&self.path)
    }
}

impl Drop for FakeRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

#[test]
fn enumerates_only_numeric_directories() {
    let root = FakeRoot::new("numeric");
    root.process(1, "init", 10, 5)
        .process(300, "nginx", 700, 90)
        .file("self/stat", "1 (init) S 0 1 1 0 -1 0 0 0 0 0 10 5 0 0")
        .file("cpuinfo", "processor : 0\n")
        .file("stat", "cpu 1 2 3 4 5 6 7 8\n");

    let mut log = MemoryEventLog::default();
    let snapshot = Collector::new(root.source()).snapshot(Some(&mut log)).unwrap();
    let mut pids: Vec<u32> = snapshot.iter().map(|p| p.pid()).collect();
    pids.sort_unstable();
    assert_eq!(pids, [1, 300]);
    assert_eq!(snapshot.skipped, 0);
    assert_eq!(log.lines(), ["enumerated 2 processes (0 skipped)"]);
}

#[test]
fn short_record_is_skipped_not_fatal() {
    let root = FakeRoot::new("short");
    root.process(1, "init", 10, 5)
        // only ten fields: no tick counters
        .file("2/stat", "2 (kthreadd) S 0 0 0 0 -1 0 0 0")
        .file("2/comm", "kthreadd\n");

    let snapshot = Collector::new(root.source()).snapshot(None).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.skipped, 1);
    assert_eq!(top_n(snapshot, 10)[0].name(), "init");
}

#[test]
fn unreadable_name_falls_back_to_unknown() {
    let root = FakeRoot::new("noname");
    root.file("9/stat", "9 (ghost) S 1 9 9 0 -1 0 0 0 0 0 3 4 0 0");

    let snapshot = Collector::new(root.source()).snapshot(None).unwrap();
    let ranked = top_n(snapshot, 1);
    assert_eq!(ranked[0].name(), "unknown");
    assert_eq!(ranked[0].total_ticks(), 7);
}

#[test]
fn missing_root_is_enumeration_failure() {
    let root = FakeRoot::new("gone");
    let source = ProcFs::new(root.path.join("does-not-exist"));

    let mut log = MemoryEventLog::default();
    let err = Collector::new(source).snapshot(Some(&mut log)).unwrap_err();
    assert!(matches!(err, SampleError::EnumerationUnavailable { .. }));
    assert!(log.lines()[0].starts_with("process enumeration failed: cannot list process registry"));
}

#[test]
fn cpu_sampler_reads_aggregate_line() {
    let root = FakeRoot::new("cpu");
    root.file("stat", "cpu  10 0 5 80 1 0 0 0\ncpu0 10 0 5 80 1 0 0 0\nintr 1\n");

    let sampler = CpuSampler::new(root.source(), Duration::from_millis(20));
    let counters = sampler.read_counters().unwrap();
    assert_eq!(counters.total(), 96);

    let mut log = MemoryEventLog::default();
    let usage = sampler.measure(Some(&mut log)).unwrap();
    assert!(usage.elapsed >= Duration::from_millis(20));
    // static counters: nothing moved
    assert_eq!(usage.delta_total, 1);
    assert_eq!(usage.active, 0.0);
    assert!(log.lines()[0].starts_with("cpu sample: active 0.0%"));
}

#[test]
fn missing_stat_is_counter_failure() {
    let root = FakeRoot::new("nostat");
    root.process(1, "init", 1, 1);

    let mut log = MemoryEventLog::default();
    let err = CpuSampler::new(root.source(), Duration::from_millis(1))
        .measure(Some(&mut log))
        .unwrap_err();
    assert!(matches!(err, SampleError::CounterUnavailable { .. }));
    assert!(err.to_string().starts_with("CPU counters unavailable"));
    assert!(log.lines()[0].starts_with("cpu sample failed: CPU counters unavailable"));
}
