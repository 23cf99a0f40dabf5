// Build script that tries to generate a C header with `cbindgen`.
// If `cbindgen` is not available, it falls back to copying the
// checked-in `include/gendyn.h` to $OUT_DIR.
//
// Either way, consumers can include the header from:
//   - <repo>/gendyn-ffi/include/gendyn.h   (checked-in)
//   - $OUT_DIR/gendyn.h

use std::{env, fs, path::PathBuf, process::Command};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/gendyn.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let header_repo = crate_dir.join("include").join("gendyn.h");
    let header_out = out_dir.join("gendyn.h");

    let have_cbindgen = Command::new("cbindgen")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if have_cbindgen {
        let generated = Command::new("cbindgen")
            .args(["--crate", "gendyn-ffi", "--lang", "C", "--cpp-compat", "--output"])
            .arg(&header_out)
            .current_dir(&crate_dir)
            .status()
            .map(|s| s.success())
            .unwrap_or(false);

        if generated {
            println!("cargo:warning=gendyn-ffi: generated header with cbindgen -> {}", header_out.display());
            return;
        }
        println!("cargo:warning=gendyn-ffi: cbindgen failed; using checked-in header");
    }

    fs::copy(&header_repo, &header_out).expect("failed to copy include/gendyn.h to OUT_DIR");
}
