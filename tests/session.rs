// ©2024 Otmar Klenk
//! End-to-end sessions through the file driver.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;

static SEQ: AtomicUsize = AtomicUsize::new(0);

fn scratch_file(source: &str) -> PathBuf {
    let n = SEQ.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("cforth_session_{}_{n}.fth", std::process::id()));
    fs::write(&path, source).expect("write scratch file");
    path
}

fn run_files(paths: &[&PathBuf], input: &str, extra_args: &[&str]) -> (String, String) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cforth"));
    cmd.env("HOME", std::env::temp_dir());  // keep any real init file out of the session
    for arg in extra_args {
        cmd.arg(arg);
    }
    for path in paths {
        cmd.arg(path);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn interpreter");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for interpreter");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn run_source(source: &str, input: &str, extra_args: &[&str]) -> (String, String) {
    let path = scratch_file(source);
    let rslt = run_files(&[&path], input, extra_args);
    let _ = fs::remove_file(&path);
    rslt
}

/////////////////////////////////////////////////////////////////////////////////////////

#[rstest]
#[case("10 20 + .", "30 ok\n")]
#[case(": SQUARE DUP * ; 7 SQUARE .", "49 ok\n")]
#[case("VARIABLE X 5 X ! X @ .", "5 ok\n")]
#[case(": COUNTDOWN 10 0 DO I . -1 +LOOP ; COUNTDOWN", "10 9 8 7 6 5 4 3 2 1 ok\n")]
#[case(": ABSVAL DUP 0 < IF NEGATE THEN ; -7 ABSVAL .", "7 ok\n")]
#[case(": FACT DUP 1 > IF DUP 1 - FACT * ELSE DROP 1 THEN ; 5 FACT .", "120 ok\n")]
#[case("CREATE PAIR 3 , 4 , PAIR @ . PAIR 1 + @ .", "3 4 ok\n")]
#[case("255 16 BASE ! . DECIMAL", "FF ok\n")]
#[case("16 BASE ! FF DECIMAL .", "255 ok\n")]
#[case("16 BASE ! 255 . DECIMAL", "255 ok\n")]
#[case("1 2 < . 2 1 < .", "TRUE FALSE ok\n")]
#[case("1 2.5 + .", "3.5 ok\n")]
#[case("( a comment) 7 .", "7 ok\n")]
#[case(".\" hello\" 10 EMIT", "hello\nok\n")]
#[case("1 2 3 PSTACK 10 EMIT", "1 2 3\nok\n")]
#[case("-7 3 MOD . 7 3 /MOD . .", "-1 2 1 ok\n")]
#[case("-1 1 U< . 1 2 U< .", "FALSE TRUE ok\n")]
#[case("5 ?DUP . . 0 ?DUP .", "5 5 0 ok\n")]
#[case("3 4 MAX . 3 4 MIN . -5 ABS . 5 NEGATE .", "4 3 5 -5 ok\n")]
#[case("1 2 < 2 1 < OR . 6 3 AND . 2 NOT .", "TRUE 2 -3 ok\n")]
#[case("1 2 3 ROT . . .", "1 3 2 ok\n")]
#[case("VARIABLE N 40 N ! 2 N +! N ? ", "42 ok\n")]
#[case("10 CONSTANT TEN TEN TEN * .", "100 ok\n")]
#[case("32 WORD hello COUNT TYPE 10 EMIT", "hello\nok\n")]
#[case("88 WORD ab  X COUNT -TRAILING TYPE 10 EMIT", "ab\nok\n")]
#[case(": CON CREATE , DOES> @ ; 5 CON FIVE FIVE .", "5 ok\n")]
#[case("VARIABLE V 1 V ! VARIABLE V 2 V ! FORGET V V @ .", "1 ok\n")]
#[case("5 BEGIN DUP . 1 - DUP 0 = UNTIL DROP", "5 4 3 2 1 ok\n")]
#[case(": SUM 0 SWAP 1 SWAP DO I + LOOP ; 5 SUM .", "10 ok\n")]
#[case("2 7 1 */ .", "14 ok\n")]
fn session_prints(#[case] source: &str, #[case] expected: &str) {
    let (stdout, stderr) = run_source(source, "", &[]);
    assert_eq!(stdout, expected, "stderr: {stderr}");
    assert_eq!(stderr, "");
}

#[rstest]
#[case("BOGUS", "BOGUS ?\n")]
#[case("5 0 / .", "Division by zero\n")]
#[case("DUP", "STACK EMPTY\n")]
#[case("1 LEAVE", "Leave not inside do\n")]
#[case("1 ,", "No current variable\n")]
#[case("2147483648", "Overflow\n")]
#[case("1 2 !", "Not a variable\n")]
#[case("FORGET NOPE", "Unknown word\n")]
#[case(": BROKEN 1 2", "Missing word\n")]
#[case("I", "Not in DO\n")]
fn session_reports(#[case] source: &str, #[case] expected_err: &str) {
    let (stdout, stderr) = run_source(source, "", &[]);
    assert_eq!(stdout, "", "stdout: {stdout}");
    assert_eq!(stderr, expected_err);
}

#[test]
fn load_suspends_and_resumes_the_line() {
    let inner = scratch_file("32");
    let outer_src = format!("10 LOAD {} + .", inner.display());
    let outer = scratch_file(&outer_src);
    let (stdout, stderr) = run_files(&[&outer], "", &[]);
    let _ = fs::remove_file(&inner);
    let _ = fs::remove_file(&outer);
    assert_eq!(stdout, "ok\n42 ok\n", "stderr: {stderr}");
    assert_eq!(stderr, "");
}

#[test]
fn abort_abandons_the_file_but_not_the_session() {
    let first = scratch_file("1 2 ABORT 3 .");
    let second = scratch_file("5 .");
    let (stdout, stderr) = run_files(&[&first, &second], "", &[]);
    let _ = fs::remove_file(&first);
    let _ = fs::remove_file(&second);
    assert_eq!(stdout, "5 ok\n", "stderr: {stderr}");
    assert_eq!(stderr, "");
}

#[test]
fn expect_reads_piped_input() {
    let (stdout, stderr) =
        run_source("CREATE BUF 10 ALLOT BUF 5 EXPECT BUF 3 TYPE 10 EMIT", "abcdefg\n", &[]);
    assert_eq!(stdout, "abc\nok\n", "stderr: {stderr}");
    assert_eq!(stderr, "");
}

#[test]
fn base_is_only_predefined_by_init() {
    let (stdout, stderr) = run_source("BASE @ .", "", &[]);
    assert_eq!(stdout, "10 ok\n", "stderr: {stderr}");
    assert_eq!(stderr, "");

    let (stdout, stderr) = run_source("BASE", "", &["-no_init"]);
    assert_eq!(stdout, "");
    assert_eq!(stderr, "BASE ?\n");
}

#[test]
fn unknown_flag_warns_and_continues() {
    let (stdout, stderr) = run_source("1 .", "", &["-wat"]);
    assert_eq!(stdout, "1 ok\n");
    assert_eq!(stderr, "Invalid arg: -wat\n");
}

#[test]
fn errors_keep_one_per_file() {
    let first = scratch_file("1 BOGUS 2 .");
    let second = scratch_file("7 .");
    let (stdout, stderr) = run_files(&[&first, &second], "", &[]);
    let _ = fs::remove_file(&first);
    let _ = fs::remove_file(&second);
    assert_eq!(stdout, "7 ok\n");
    assert_eq!(stderr, "BOGUS ?\n");
}
