use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // Tagged builds report the crate version; everything else reports the commit.
    let tagged = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();
    let commit = if tagged {
        String::new()
    } else {
        git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default()
    };

    println!("cargo:rustc-env=WEBPIFY_COMMIT={commit}");
    println!("cargo:rustc-env=WEBPIFY_TAGGED={tagged}");
}
