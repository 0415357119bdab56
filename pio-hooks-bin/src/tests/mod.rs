use {
    crate::ExitCode,
    std::path::{Path, PathBuf},
};

const PROPERTIES: &str = r#"// generated by PlatformIO
{
    "configurations": [
        {
            "name": "PlatformIO",
            "includePath": ["/home/dev/frame/include"],
            "defines": ["ARDUINO=10812", "MBEDTLS_CONFIG_FILE=\"mbedtls/esp_config.h\""],
            "cppStandard": "gnu++17",
            "compilerPath": "/home/dev/.platformio/packages/toolchain-xtensa-esp32/bin/xtensa-esp32-elf-g++"
        }
    ]
}
"#;

/// Print the build date define for a fixed date.
#[test]
fn build_date_fixed() {
    let output = test(["build-date", "--date", "20240409"]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert_eq!(output.stdout, "-DBUILD_DATE=\"20240409\"\n");
    assert!(output.stderr.is_empty());
}

/// Print the build date define for today.
#[test]
fn build_date_today() {
    let today = chrono::Local::now().date_naive().format("%Y%m%d").to_string();
    let output = test(["build-date"]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains(&today));
}

/// Reject a date in the wrong format.
#[test]
fn build_date_invalid() {
    let output = test(["build-date", "--date", "2024-04-09"]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains(r#"invalid date: "2024-04-09""#));
}

/// Print the program name from the context file.
#[test]
fn prog_name() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        [options]
        custom_fw_version = "1.4"
        "#,
    );
    let output = test(["prog-name", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert_eq!(output.stdout, "esp32dev_fw_1.4\n");
}

/// Non-string option values are accepted.
#[test]
fn prog_name_numeric_version() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        [options]
        custom_fw_version = 2
        "#,
    );
    let output = test(["prog-name", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert_eq!(output.stdout, "esp32dev_fw_2\n");
}

/// The firmware version is required.
#[test]
fn prog_name_missing_version() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(dir.path(), r#"env = "esp32dev""#);
    let output = test(["prog-name", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("custom_fw_version"));
}

/// Missing context file.
#[test]
fn context_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let output = test(["prog-name", "-c", missing.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stderr.contains("failed to read config file"));
}

/// Unknown keys in the context file are rejected.
#[test]
fn context_file_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        enviroment = "typo"
        "#,
    );
    let output = test(["prog-name", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stderr.contains("config file format error in TOML"));
}

/// Unknown subcommands are reported by clap.
#[test]
fn unknown_command() {
    let output = test(["flash"]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("flash"));
}

/// Help goes to stdout and is not an error.
#[test]
fn help() {
    let output = test(["--help"]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("manifest"));
    assert!(output.stderr.is_empty());
}

/// A missing properties file is skipped.
#[test]
fn clangd_missing_properties() {
    let dir = tempfile::tempdir().unwrap();
    let output = test(["clangd", "--project-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("not found, skipped"));
    assert!(!dir.path().join(".clangd").exists());
}

/// Generate the config, then find it up to date.
#[test]
fn clangd_generate_then_up_to_date() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join(".vscode/c_cpp_properties.json"), PROPERTIES);

    let output = test(["clangd", "--project-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("generated"));
    let config = std::fs::read_to_string(dir.path().join(".clangd")).unwrap();
    assert!(config.contains(r#"- "-std=gnu++17""#));
    assert!(config.contains(r#"- '-DMBEDTLS_CONFIG_FILE="mbedtls/esp_config.h"'"#));
    assert!(config.contains("xtensa-esp32-elf/include/c++/8.4.0"));

    let output = test(["clangd", "--project-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("is up to date"));
}

/// Explicit input and output paths.
#[test]
fn clangd_explicit_paths() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("props.jsonc");
    let output_path = dir.path().join("clangd.yaml");
    write(&input, PROPERTIES);
    let output = test([
        "clangd",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
    ]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output_path.exists());
}

/// Malformed properties fail when run by hand and are logged in hook mode.
#[test]
fn clangd_malformed_properties() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join(".vscode/c_cpp_properties.json"),
        "{ \"configurations\": [",
    );

    let output = test(["clangd", "--project-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("invalid c_cpp_properties.json"));

    let output = test([
        "clangd",
        "--hook",
        "--project-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("not generated"));
    assert!(output.stderr.is_empty());
}

/// An empty configurations list is an error when run by hand.
#[test]
fn clangd_no_configurations() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join(".vscode/c_cpp_properties.json"),
        r#"{ "configurations": [] }"#,
    );
    let output = test(["clangd", "--project-dir", dir.path().to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stderr.contains("no configurations found"));
}

/// Generate a manifest for an ESP32-S3 with every image present.
#[test]
fn manifest_all_parts() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "s3"
        build_dir = "build"
        prog_name = "s3_fw_1.4"
        [options]
        custom_fw_name = "'Photo Frame'"
        custom_fw_version = "'1.4'"
        [board]
        "build.mcu" = "esp32s3"
        "#,
    );
    for file in [
        "bootloader.bin",
        "partitions.bin",
        "boot_app0.bin",
        "s3_fw_1.4.bin",
    ] {
        write(&dir.path().join("build").join(file), "image");
    }

    let output = test(["manifest", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.contains("Photo Frame"));
    assert!(output.stdout.contains("ESP32-S3"));
    assert!(output.stdout.contains("5 B"));
    // Offsets are six hex digits wide.
    assert!(output.stdout.contains("0x000000 bootloader.bin"));
    assert!(output.stdout.contains("0x008000 partitions.bin"));
    assert!(output.stdout.contains("0x00e000 boot_app0.bin"));
    assert!(output.stdout.contains("0x010000 s3_fw_1.4.bin"));

    let manifest = read_json(&dir.path().join("build/manifest_full.json"));
    assert_eq!(
        manifest,
        serde_json::json!({
            "name": "Photo Frame",
            "version": "1.4",
            "new_install_prompt_erase": true,
            "improv": true,
            "builds": [{
                "chipFamily": "ESP32-S3",
                "parts": [
                    { "path": "bootloader.bin", "offset": 0 },
                    { "path": "partitions.bin", "offset": 32768 },
                    { "path": "boot_app0.bin", "offset": 57344 },
                    { "path": "s3_fw_1.4.bin", "offset": 65536 },
                ],
            }],
        })
    );
}

/// The vendor boot_app0.bin is copied from the framework package.
#[test]
fn manifest_copies_boot_app0() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        build_dir = "build"
        [packages]
        framework-arduinoespressif32 = "packages/framework-arduinoespressif32"
        "#,
    );
    write(
        &dir.path()
            .join("packages/framework-arduinoespressif32/tools/partitions/boot_app0.bin"),
        "otadata",
    );
    write(&dir.path().join("build/firmware.bin"), "app");

    let output = test(["manifest", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(dir.path().join("build/boot_app0.bin").exists());

    let manifest = read_json(&dir.path().join("build/manifest_full.json"));
    assert_eq!(manifest["name"], "firmware");
    assert_eq!(manifest["version"], "2.0");
    assert_eq!(manifest["builds"][0]["chipFamily"], "ESP32");
    assert_eq!(
        manifest["builds"][0]["parts"],
        serde_json::json!([
            { "path": "boot_app0.bin", "offset": 57344 },
            { "path": "firmware.bin", "offset": 65536 },
        ])
    );
}

/// CLI overrides for the build directory and MCU.
#[test]
fn manifest_cli_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(dir.path(), r#"env = "c3""#);
    let build = dir.path().join("out");
    std::fs::create_dir_all(&build).unwrap();

    let output = test([
        "manifest",
        "-c",
        context.to_str().unwrap(),
        "--build-dir",
        build.to_str().unwrap(),
        "--mcu",
        "esp32c3",
    ]);
    assert_eq!(output.exit_code, ExitCode(0));
    // The application has not been built yet.
    assert!(output.stdout.contains("missing"));
    let manifest = read_json(&build.join("manifest_full.json"));
    assert_eq!(manifest["builds"][0]["chipFamily"], "ESP32-C3");
}

/// Without a build_dir the PlatformIO default is used.
#[test]
fn manifest_default_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(dir.path(), r#"env = "esp32dev""#);
    std::fs::create_dir_all(dir.path().join(".pio/build/esp32dev")).unwrap();

    let output = test(["manifest", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(dir
        .path()
        .join(".pio/build/esp32dev/manifest_full.json")
        .exists());
}

/// Values must not be given both in the context and on the CLI.
#[test]
fn manifest_conflicting_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        build_dir = "build"
        [board]
        "build.mcu" = "esp32"
        "#,
    );

    let output = test([
        "manifest",
        "-c",
        context.to_str().unwrap(),
        "--mcu",
        "esp32s3",
    ]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output
        .stderr
        .contains("mcu specified in both context and cli"));

    let output = test([
        "manifest",
        "-c",
        context.to_str().unwrap(),
        "--build-dir",
        "elsewhere",
    ]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output
        .stderr
        .contains("build dir specified in both context and cli"));
}

/// A manifest that cannot be written is an error when run by hand.
#[test]
fn manifest_unwritable_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        build_dir = "does/not/exist"
        "#,
    );
    let output = test(["manifest", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stderr.contains("failed to write manifest"));
}

/// Pre build prints the settings for the build.
#[test]
fn pre_build() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        [options]
        custom_fw_version = "1.4"
        "#,
    );
    write(&dir.path().join(".vscode/c_cpp_properties.json"), PROPERTIES);

    let output = test([
        "pre-build",
        "-c",
        context.to_str().unwrap(),
        "--date",
        "20240409",
    ]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert_eq!(
        output.stdout,
        "PROGNAME=esp32dev_fw_1.4\nCPPDEFINE=-DBUILD_DATE=\"20240409\"\n"
    );
    assert!(dir.path().join(".clangd").exists());
}

/// Pre build fails without a firmware version.
#[test]
fn pre_build_missing_version() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(dir.path(), r#"env = "esp32dev""#);
    let output = test(["pre-build", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("custom_fw_version"));
}

/// Pre build is not affected by a broken properties file.
#[test]
fn pre_build_survives_bad_properties() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        [options]
        custom_fw_version = "1.4"
        "#,
    );
    write(&dir.path().join(".vscode/c_cpp_properties.json"), "{");

    let output = test(["pre-build", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stdout.starts_with("PROGNAME=esp32dev_fw_1.4\n"));
}

/// Post build writes the manifest for the renamed program.
#[test]
fn post_build() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        build_dir = "build"
        [options]
        custom_fw_version = "1.4"
        [board]
        "build.mcu" = "esp32c3"
        "#,
    );
    for file in ["bootloader.bin", "partitions.bin", "esp32dev_fw_1.4.bin"] {
        write(&dir.path().join("build").join(file), "image");
    }

    let output = test(["post-build", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));

    let manifest = read_json(&dir.path().join("build/manifest_full.json"));
    assert_eq!(manifest["name"], "esp32dev_fw_1.4");
    assert_eq!(
        manifest["builds"][0]["parts"],
        serde_json::json!([
            { "path": "bootloader.bin", "offset": 0 },
            { "path": "partitions.bin", "offset": 32768 },
            { "path": "esp32dev_fw_1.4.bin", "offset": 65536 },
        ])
    );
}

/// Post build never fails because of the manifest.
#[test]
fn post_build_unwritable_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let context = write_context(
        dir.path(),
        r#"
        env = "esp32dev"
        build_dir = "does/not/exist"
        [options]
        custom_fw_version = "1.4"
        "#,
    );
    let output = test(["post-build", "-c", context.to_str().unwrap()]);
    assert_eq!(output.exit_code, ExitCode(0));
    assert!(output.stderr.is_empty());
}

fn test<const N: usize>(args: [&str; N]) -> Output {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = crate::main_args(
        std::iter::once("pio-hooks").chain(args),
        &mut stdout,
        &mut stderr,
    );
    println!("* args: {:?}", args);
    println!("* exit_code: {:?}", exit_code);
    println!("* stdout:\n{}", String::from_utf8_lossy(&stdout));
    println!("* stderr:\n{}", String::from_utf8_lossy(&stderr));
    Output {
        exit_code,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

#[derive(Debug)]
struct Output {
    exit_code: ExitCode,
    stdout: String,
    stderr: String,
}

fn write(path: &Path, contents: &str) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn write_context(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("context.toml");
    write(&path, contents);
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
