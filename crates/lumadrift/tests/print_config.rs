use std::fs;
use std::process::{Command, Output};

use driftconfig::{Config, ParamValue};
use tempfile::TempDir;

fn lumadrift(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lumadrift"))
        .env("LUMADRIFT_CONFIG_DIR", config_dir.path())
        .env("RUST_LOG", "error")
        .arg("--print-config")
        .args(args)
        .output()
        .expect("spawn lumadrift")
}

fn write_config(dir: &TempDir, contents: &str) {
    fs::write(dir.path().join("lumadrift.toml"), contents).expect("write config");
}

#[test]
fn prints_merged_configuration() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "[clock]\nfps_window = \"1s\"\n[parameters]\ntimeScale = 0.75\ncolorTint = [0.5, 1.0, 1.25]\n",
    );

    let output = lumadrift(&dir, &["--seed", "7"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = String::from_utf8(output.stdout).unwrap();
    let config = Config::from_toml_str(&text).expect("printed config parses");
    assert_eq!(config.render.seed, Some(7));
    assert_eq!(config.clock.fps_window.as_millis(), 1000);
    assert_eq!(
        config.parameters.get("timeScale"),
        Some(&ParamValue::Scalar(0.75))
    );
    assert_eq!(
        config.parameters.get("colorTint"),
        Some(&ParamValue::Color([0.5, 1.0, 1.25]))
    );
}

#[test]
fn size_flag_overrides_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[window]\nwidth = 1920\nheight = 1080\n");

    let output = lumadrift(&dir, &["--size", "640x360"]);
    assert!(output.status.success());
    let config = Config::from_toml_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!((config.window.width, config.window.height), (640, 360));
}

#[test]
fn missing_file_prints_defaults() {
    let dir = TempDir::new().unwrap();
    let output = lumadrift(&dir, &[]);
    assert!(output.status.success());
    let config = Config::from_toml_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn out_of_domain_parameter_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[parameters]\nsaturation = 5.0\n");

    let output = lumadrift(&dir, &[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("saturation"), "{stderr}");
}

#[test]
fn unknown_parameter_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[parameters]\nwarp = 1.0\n");

    let output = lumadrift(&dir, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warp"), "{stderr}");
}
