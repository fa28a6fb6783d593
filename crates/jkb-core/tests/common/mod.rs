#![allow(dead_code)]

pub mod http_server;

use std::io::Write;

/// Build a tar archive in memory from `(path, contents)` pairs.
pub fn tar_bytes(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn bz2(data: &[u8]) -> Vec<u8> {
    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn gz(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// A small stand-in for `public_sources.tbz2`: the three nested source
/// archives under `Linux_for_Tegra/source/`, plus an unrelated member.
pub fn public_sources() -> Vec<u8> {
    let kernel = bz2(&tar_bytes(&[
        ("kernel/kernel-jammy-src/Makefile", b"VERSION = 5\n".to_vec()),
        ("kernel/kernel-jammy-src/arch/arm64/Kconfig", b"config ARM64\n".to_vec()),
    ]));
    let oot = bz2(&tar_bytes(&[("nvidia-oot/Makefile", b"obj-m += nvidia/\n".to_vec())]));
    let display = bz2(&tar_bytes(&[("nvdisplay/Makefile", b"all:\n".to_vec())]));
    bz2(&tar_bytes(&[
        ("Linux_for_Tegra/source/kernel_src.tbz2", kernel),
        ("Linux_for_Tegra/source/kernel_oot_modules_src.tbz2", oot),
        ("Linux_for_Tegra/source/nvidia_kernel_display_driver_source.tbz2", display),
        ("Linux_for_Tegra/source/u-boot_src.tbz2", b"unused".to_vec()),
    ]))
}

pub fn sha1_hex(data: &[u8]) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(data))
}

pub const RELEASE: &str =
    "# R36 (release), REVISION: 4.3, GCID: 38968081, BOARD: generic, EABI: aarch64, DATE: Wed Jan  8 01:49:37 UTC 2025\n";

pub const RUNNING_CONFIG: &str = "CONFIG_ARM64=y\nCONFIG_LOCALVERSION=\"\"\nCONFIG_MODULES=y\n";
