#![cfg(all(unix, feature = "cli"))]

use std::io::Read;
use std::net::UdpSocket;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use satlink_frame::{encode_housekeeping, to_hex, HousekeepingReadings};

fn satlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_satlink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn red_yellow_frame(satellite_id: u16) -> String {
    let readings = HousekeepingReadings {
        battery_voltage_mv: 10_800,
        battery_temp_c: 18,
        msi_temperature_c: 52,
        ssr_used_mb: 4_096,
    };
    to_hex(&encode_housekeeping(satellite_id, 1_700_000_000, &readings))
}

fn free_udp_port() -> u16 {
    let probe = UdpSocket::bind("127.0.0.1:0").expect("probe bind should succeed");
    probe
        .local_addr()
        .expect("probe should have an address")
        .port()
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(Some(status)) = child.try_wait() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(25));
    }
    None
}

#[test]
fn decode_prints_frame_and_alerts_as_json() {
    let output = satlink()
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(red_yellow_frame(9))
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("decode output should be JSON");
    assert_eq!(value["satellite_id"], 9);
    assert_eq!(value["packet_type"], "HOUSEKEEPING");
    assert_eq!(value["msi_temperature_c"], 52);
    assert_eq!(value["alerts"][0]["level"], "RED");
    assert_eq!(value["alerts"][1]["level"], "YELLOW");
}

#[test]
fn decode_garbage_returns_60() {
    let output = satlink()
        .arg("decode")
        .arg("1ACF0000")
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("packet too short"));
}

#[test]
fn version_prints_package_version() {
    let output = satlink().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("satlink {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn listen_receives_sent_frame_and_exits_after_count() {
    let port = free_udp_port();
    let mut child = satlink()
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--count")
        .arg("1")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen should start");

    // Resend until the listener is bound and has counted one frame.
    let hex = red_yellow_frame(4);
    let start = Instant::now();
    let status = loop {
        let send = satlink()
            .arg("send")
            .arg("--port")
            .arg(port.to_string())
            .arg("--hex")
            .arg(&hex)
            .stdout(Stdio::null())
            .status()
            .expect("send should run");
        assert!(send.success());

        if let Some(status) = wait_with_timeout(&mut child, Duration::from_millis(200)) {
            break status;
        }
        if start.elapsed() > Duration::from_secs(10) {
            let _ = child.kill();
            let _ = child.wait();
            panic!("listener did not exit after receiving a frame");
        }
    };

    assert!(status.success());
    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout should be piped")
        .read_to_string(&mut stdout)
        .expect("stdout should be readable");
    let first = stdout.lines().next().expect("listener should print a frame");
    let value: serde_json::Value = serde_json::from_str(first).expect("frame line should be JSON");
    assert_eq!(value["satellite_id"], 4);
    assert_eq!(value["alerts"].as_array().map(Vec::len), Some(2));
}
