use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "wasidoom", about = "Runs the WASI build of DOOM in a window")]
pub struct Cli {
    /// Path of the guest wasm module
    #[arg(default_value = "./wasidoom.wasm")]
    pub wasm: PathBuf,

    /// Path of the game data file the guest opens as "./doom1.wad"
    #[arg(long, default_value = "./doom1.wad")]
    pub wad: PathBuf,

    /// Integer upscaling factor for the 320x200 frame
    #[arg(long, default_value_t = 2)]
    pub scale: u32,
}
