use std::{fs, io};

const PROTO_DIR: &str = "./protos/";
const GENERATED_DIR: &str = "./generated/";

fn main() -> io::Result<()> {
    let proto = format!("{}kv.proto", PROTO_DIR);
    println!("cargo:rerun-if-changed={}", proto);

    fs::create_dir_all(GENERATED_DIR)?;
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .out_dir(GENERATED_DIR)
        .compile(&[proto.as_str()], &[PROTO_DIR])
}
