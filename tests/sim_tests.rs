//! Integration tests for musim
//!
//! End-to-end scenarios driven through the scheduler's public surface
//! with a scripted operator console.

use musim::config::SystemConfig;
use musim::console::ScriptedConsole;
use musim::mm::FrameEntry;
use musim::pcb::AccessMode;
use musim::sched::{DeviceClass, Scheduler};

fn scheduler(config: SystemConfig) -> Scheduler {
    Scheduler::new(config).unwrap()
}

mod lifecycle_tests {
    use super::*;

    fn config() -> SystemConfig {
        SystemConfig {
            total_memory: 128,
            page_size: 32,
            max_process_size: 128,
            printers: 1,
            disk_cylinders: vec![100],
            optical_drives: 1,
            history_parameter: 0.5,
            initial_burst_estimate: 10.0,
        }
    }

    #[test]
    fn test_three_process_lifecycle() {
        let mut sched = scheduler(config());
        let mut console = ScriptedConsole::new();
        console
            .push_burst(2.0) // P1's slice when P2 arrives
            .push_burst(6.0) // P1's burst at its disk request
            .push_burst(4.0) // P2's final burst
            .push_burst(1.0) // P1's final slice when killed
            .push_burst(3.0) // P3's final burst
            .push_filename("alpha")
            .push_start_address(0x20)
            .push_access_mode(AccessMode::Read)
            .push_file_length(10)
            .push_cylinder(55);

        // P1 (2 pages) takes the CPU; P2's arrival preempts it but P1's
        // shrunken estimate (10 - 2 = 8) beats P2's fresh 10.
        let p1 = sched.submit_process(60, &mut console).unwrap();
        let p2 = sched.submit_process(33, &mut console).unwrap();
        assert_eq!(sched.cpu().unwrap().pid, p1);
        assert_eq!(sched.cpu().unwrap().expected_burst_remaining, 8.0);
        assert_eq!(sched.ready_queue()[0].pid, p2);

        // P3 (4 pages) finds no free frames and waits in the job pool.
        let p3 = sched.submit_process(100, &mut console).unwrap();
        assert!(sched.memory().is_queued(p3));

        // P1 requests disk I/O: its whole 2+6 ms burst feeds the
        // smoothing ((10 + 8) / 2 = 9) and P2 refills the CPU.
        sched
            .request_device_io(DeviceClass::Disk, 0, &mut console)
            .unwrap();
        let waiting = &sched.device_queue(DeviceClass::Disk, 0).unwrap()[0];
        assert_eq!(waiting.pid, p1);
        assert_eq!(waiting.filename, "alpha");
        assert_eq!(waiting.cylinder, Some(55));
        assert_eq!(waiting.expected_burst_remaining, 9.0);
        assert_eq!(sched.cpu().unwrap().pid, p2);

        // P2 terminates; its two freed frames are not enough for P3.
        sched.complete_cpu_burst(&mut console).unwrap();
        assert!(sched.cpu().is_none());
        assert!(sched.memory().is_queued(p3));
        assert_eq!(sched.stats().avg_cpu_usage, 4.0);

        // The disk interrupt brings P1 back to the idle CPU.
        sched
            .complete_device_io(DeviceClass::Disk, 0, &mut console)
            .unwrap();
        assert_eq!(sched.cpu().unwrap().pid, p1);
        assert_eq!(sched.cpu().unwrap().cylinder, None);

        // Killing P1 in the CPU collects its final slice (total 9 ms)
        // and releases enough memory to promote and schedule P3.
        sched.kill(p1, &mut console).unwrap();
        assert_eq!(sched.stats().avg_cpu_usage, 6.5);
        assert!(!sched.memory().is_queued(p3));
        assert_eq!(sched.cpu().unwrap().pid, p3);

        sched.complete_cpu_burst(&mut console).unwrap();

        let stats = sched.stats();
        assert_eq!(stats.processes_created, 3);
        assert_eq!(stats.terminated, 3);
        assert!((stats.avg_cpu_usage - 16.0 / 3.0).abs() < 1e-9);
        assert!(sched.cpu().is_none());
        assert!(sched.ready_queue().is_empty());
        assert_eq!(sched.memory().free_count(), 4);
        assert!(sched.memory().job_pool().is_empty());
    }
}

mod memory_tests {
    use super::*;

    fn config() -> SystemConfig {
        SystemConfig {
            total_memory: 64,
            page_size: 16,
            max_process_size: 64,
            printers: 1,
            disk_cylinders: vec![10],
            optical_drives: 1,
            history_parameter: 0.5,
            initial_burst_estimate: 10.0,
        }
    }

    #[test]
    fn test_admission_exhaustion_and_promotion() {
        let mut sched = scheduler(config());
        let mut console = ScriptedConsole::new();
        console
            .push_burst(0.0) // P1's slice at P3's arrival
            .push_burst(1.0) // P3's final burst
            .push_burst(2.0); // P1's final burst

        // 48 + 32 exceeds 64: P2 waits while the smaller P3 still fits.
        let p1 = sched.submit_process(48, &mut console).unwrap();
        let p2 = sched.submit_process(32, &mut console).unwrap();
        let p3 = sched.submit_process(16, &mut console).unwrap();
        assert!(sched.memory().is_queued(p2));
        assert!(!sched.memory().is_queued(p3));
        assert_eq!(sched.memory().free_count(), 0);

        // P3 terminating frees one frame; P2 needs two and stays queued.
        assert_eq!(sched.cpu().unwrap().pid, p3);
        sched.complete_cpu_burst(&mut console).unwrap();
        assert!(sched.memory().is_queued(p2));
        assert_eq!(sched.memory().free_count(), 1);

        // P1 terminating frees the rest; P2 is promoted and scheduled.
        assert_eq!(sched.cpu().unwrap().pid, p1);
        sched.complete_cpu_burst(&mut console).unwrap();
        assert!(!sched.memory().is_queued(p2));
        assert_eq!(sched.cpu().unwrap().pid, p2);
        assert_eq!(sched.memory().free_count(), 2);
    }

    #[test]
    fn test_frame_conservation_through_mixed_operations() {
        let mut sched = scheduler(config());
        let mut console = ScriptedConsole::new();
        console
            .push_burst(1.0)
            .push_burst(2.0)
            .push_filename("f")
            .push_start_address(0)
            .push_file_length(1)
            .push_burst(3.0);

        let owned_plus_free = |sched: &Scheduler| {
            let owned = sched
                .memory()
                .frame_table()
                .iter()
                .filter(|e| !matches!(e, FrameEntry::Free))
                .count();
            owned + sched.memory().free_count()
        };

        let total = sched.memory().total_frames();
        assert_eq!(owned_plus_free(&sched), total);

        let p1 = sched.submit_process(48, &mut console).unwrap();
        assert_eq!(owned_plus_free(&sched), total);

        sched.submit_process(16, &mut console).unwrap();
        assert_eq!(owned_plus_free(&sched), total);

        sched.kill(p1, &mut console).unwrap();
        assert_eq!(owned_plus_free(&sched), total);

        sched
            .request_device_io(DeviceClass::Printer, 0, &mut console)
            .unwrap();
        assert_eq!(owned_plus_free(&sched), total);

        sched
            .complete_device_io(DeviceClass::Printer, 0, &mut console)
            .unwrap();
        assert_eq!(owned_plus_free(&sched), total);
    }
}

mod scheduling_tests {
    use super::*;

    fn config() -> SystemConfig {
        SystemConfig {
            total_memory: 256,
            page_size: 16,
            max_process_size: 64,
            printers: 1,
            disk_cylinders: vec![10],
            optical_drives: 1,
            history_parameter: 1.0,
            initial_burst_estimate: 10.0,
        }
    }

    #[test]
    fn test_sjf_order_across_io_returns() {
        let mut sched = scheduler(config());
        let mut console = ScriptedConsole::new();

        // Three processes park on the printer with bursts 5, 2, 8; with
        // α = 1 those become their next estimates verbatim.
        let mut pids = Vec::new();
        for burst in [5.0, 2.0, 8.0] {
            console
                .push_filename("f")
                .push_start_address(0)
                .push_file_length(1)
                .push_burst(burst);
            let pid = sched.submit_process(16, &mut console).unwrap();
            sched
                .request_device_io(DeviceClass::Printer, 0, &mut console)
                .unwrap();
            pids.push(pid);
        }
        assert!(sched.cpu().is_none());

        // They return FIFO: the 5 takes the idle CPU, the 2 preempts it
        // (1 ms slice), the 8 fails to displace the 2.
        console.push_burst(1.0).push_burst(0.0);
        for _ in 0..3 {
            sched
                .complete_device_io(DeviceClass::Printer, 0, &mut console)
                .unwrap();
        }

        assert_eq!(sched.cpu().unwrap().pid, pids[1]);
        assert_eq!(sched.cpu().unwrap().expected_burst_remaining, 2.0);
        let ready = sched.ready_queue();
        assert_eq!(ready[0].pid, pids[0]);
        assert_eq!(ready[0].expected_burst_remaining, 4.0); // 5 - 1
        assert_eq!(ready[1].pid, pids[2]);
        assert_eq!(ready[1].expected_burst_remaining, 8.0);
    }

    #[test]
    fn test_multiple_devices_queue_independently() {
        let mut sched = scheduler(SystemConfig {
            printers: 2,
            disk_cylinders: vec![10, 200],
            ..config()
        });
        let mut console = ScriptedConsole::new();

        for (class, index, cylinder) in [
            (DeviceClass::Printer, 1, None),
            (DeviceClass::Disk, 1, Some(150)),
            (DeviceClass::Optical, 0, None),
        ] {
            console
                .push_filename("f")
                .push_start_address(0)
                .push_file_length(1)
                .push_burst(1.0);
            if class != DeviceClass::Printer {
                console.push_access_mode(AccessMode::Write);
            }
            if let Some(c) = cylinder {
                console.push_cylinder(c);
            }
            sched.submit_process(16, &mut console).unwrap();
            sched
                .request_device_io(class, index, &mut console)
                .unwrap();
        }

        assert!(sched.device_queue(DeviceClass::Printer, 0).unwrap().is_empty());
        assert_eq!(sched.device_queue(DeviceClass::Printer, 1).unwrap().len(), 1);
        assert!(sched.device_queue(DeviceClass::Disk, 0).unwrap().is_empty());
        let on_disk = &sched.device_queue(DeviceClass::Disk, 1).unwrap()[0];
        assert_eq!(on_disk.cylinder, Some(150));
        assert_eq!(sched.device_queue(DeviceClass::Optical, 0).unwrap().len(), 1);
    }
}
