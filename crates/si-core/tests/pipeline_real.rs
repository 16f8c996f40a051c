//! End-to-end pipeline tests over real snapshot trees on disk.

use si_common::{Error, ServiceKey};
use si_core::pipeline::{run_inventory, InventoryOptions};
use std::path::Path;

const EXTENSION: &str = ".ret.complete";

fn write_host(
    dir: &Path,
    name: &str,
    host: &str,
    stamp: &str,
    lsof_content: &str,
    ps_content: &str,
) {
    let stem = format!("{name}.{host}.{stamp}");
    std::fs::write(dir.join(format!("{stem}{EXTENSION}")), "").expect("write marker");
    std::fs::write(dir.join(format!("{stem}.lsof")), lsof_content).expect("write lsof");
    std::fs::write(dir.join(format!("{stem}.ps")), ps_content).expect("write ps");
}

fn options(dir: &Path, workers: usize) -> InventoryOptions {
    InventoryOptions {
        results_dir: dir.to_path_buf(),
        extension: EXTENSION.to_string(),
        workers: Some(workers),
    }
}

#[test]
fn two_hosts_join_into_one_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_host(
        dir.path(),
        "alpha",
        "10.0.0.1",
        "201701010000",
        concat!(
            "p100\0g100\0u0\0csshd\0Lroot\n",
            "f5\0n*:22\0TST=LISTEN\n",
            "f6\0n[::1]:22\0TST=LISTEN\n",
            "f7\0n*:*\0TST=LISTEN\n",
        ),
        "100 root sshd /usr/sbin/sshd -D\n2000 <defunct>\n",
    );
    write_host(
        dir.path(),
        "beta",
        "10.0.0.2",
        "201701020000",
        concat!(
            "p300\0g300\0u99\0csquid\0Lnobody\n",
            "f4\0n0.0.0.0:3128\0TST=LISTEN\n",
            "f5\0n10.0.0.2:43210\0TST=ESTABLISHED\n",
        ),
        "300 nobody squid /usr/sbin/squid -N\n",
    );

    let report = run_inventory(&options(dir.path(), 2)).expect("pipeline runs");
    assert_eq!(report.hosts, 2);
    assert!(report.warnings.is_empty());
    assert_eq!(report.services.len(), 2);

    let sshd = &report.services[&ServiceKey::new("10.0.0.1", 22)];
    assert_eq!(sshd.cmd, "sshd");
    assert_eq!(sshd.pid, 100);
    assert_eq!(sshd.interface, "*");
    assert_eq!(sshd.ps_argv, "/usr/sbin/sshd -D");
    assert_eq!(sshd.ps_username, "root");

    let squid = &report.services[&ServiceKey::new("10.0.0.2", 3128)];
    assert_eq!(squid.username, "nobody");
    assert_eq!(squid.uid, "99");
    assert_eq!(squid.ps_argv_zero, "/usr/sbin/squid");

    // The IPv6 and raw-socket lines were counted, never emitted.
    assert_eq!(report.stats.listening, 4);
    assert_eq!(report.stats.ipv6_skipped, 1);
    assert_eq!(report.stats.wildcard_skipped, 1);
    assert_eq!(report.stats.files, 2);
}

#[test]
fn more_workers_than_hosts_still_joins() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_host(
        dir.path(),
        "alpha",
        "10.0.0.1",
        "201701010000",
        "p100\0g100\0u0\0csshd\0Lroot\nf5\0n127.0.0.1:22\0TST=LISTEN\n",
        "100 root sshd\n",
    );

    let report = run_inventory(&options(dir.path(), 8)).expect("pipeline runs");
    assert_eq!(report.services.len(), 1);
    assert_eq!(
        report.services[&ServiceKey::new("10.0.0.1", 22)].ps_argv,
        ""
    );
}

#[test]
fn socket_without_peer_record_is_a_join_miss() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_host(
        dir.path(),
        "alpha",
        "10.0.0.1",
        "201701010000",
        "p100\0g100\0u0\0csshd\0Lroot\nf5\0n127.0.0.1:22\0TST=LISTEN\n",
        "999 root other\n",
    );

    let err = run_inventory(&options(dir.path(), 1)).unwrap_err();
    assert!(matches!(
        err,
        Error::JoinKeyMiss { ref host, pid: 100 } if host == "10.0.0.1"
    ));
}

#[test]
fn corrupt_lsof_file_is_reported_but_does_not_abort() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_host(
        dir.path(),
        "alpha",
        "10.0.0.1",
        "201701010000",
        "pgarbage\0g100\nf5\0n127.0.0.1:80\0TST=LISTEN\n",
        "1 root init\n",
    );
    write_host(
        dir.path(),
        "beta",
        "10.0.0.2",
        "201701020000",
        "p300\0g300\0u99\0csquid\0Lnobody\nf4\0n0.0.0.0:3128\0TST=LISTEN\n",
        "300 nobody squid\n",
    );

    let report = run_inventory(&options(dir.path(), 1)).expect("pipeline runs");
    assert_eq!(report.stats.failed_files, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.services.len(), 1);
    assert!(report
        .services
        .contains_key(&ServiceKey::new("10.0.0.2", 3128)));
}

#[test]
fn missing_data_file_fails_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Marker present but no .lsof/.ps data files.
    std::fs::write(
        dir.path().join(format!("alpha.10.0.0.1.201701010000{EXTENSION}")),
        "",
    )
    .expect("write marker");

    let err = run_inventory(&options(dir.path(), 1)).unwrap_err();
    assert!(matches!(err, Error::SnapshotRead { .. }));
}

#[test]
fn malformed_marker_names_surface_as_warnings() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(format!("nohost{EXTENSION}")), "").expect("write marker");
    write_host(
        dir.path(),
        "alpha",
        "10.0.0.1",
        "201701010000",
        "p100\0g100\0u0\0csshd\0Lroot\nf5\0n127.0.0.1:22\0TST=LISTEN\n",
        "100 root sshd\n",
    );

    let report = run_inventory(&options(dir.path(), 2)).expect("pipeline runs");
    assert_eq!(report.hosts, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("nohost"));
}
