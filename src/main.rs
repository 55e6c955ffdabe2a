//! isx2gb, a converter from Intelligent Systems eXecutables to Game Boy ROMs.

#![deny(unsafe_code)]

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use log::info;
use structopt::StructOpt;

use isx2gb::error;
use isx2gb::isx::Isx;
use isx2gb::layout::report;
use isx2gb::layout::Layout;
use isx2gb::layout::Region;
use isx2gb::link;
use isx2gb::rom::Rom;
use isx2gb::sym;

/// Converts an ISX file into a Game Boy (Color) ROM.
#[derive(StructOpt, Debug)]
#[structopt(name = "isx2gb")]
struct Opts {
  /// Dump each ISX record into its own binary file instead of building a ROM.
  #[structopt(short, long)]
  dump: bool,
  /// Fill unused ROM space with 0xFF instead of 0x00.
  #[structopt(short, long)]
  fill: bool,
  /// Round the ROM size up to the next power of two.
  #[structopt(short, long)]
  round: bool,
  /// Write a symbol file for debuggers.
  #[structopt(short, long)]
  sym: bool,
  /// Write the record layout as JSON5.
  #[structopt(short, long)]
  metadata: bool,
  /// Print a hex dump of the finished ROM.
  #[structopt(short = "x", long)]
  hexdump: bool,
  /// Patch an existing ROM with the ISX records instead of building one.
  #[structopt(short, long, parse(from_os_str), conflicts_with = "dump")]
  patch: Option<PathBuf>,
  /// The ISX file to convert.
  #[structopt(parse(from_os_str))]
  input: PathBuf,
}

fn main() {
  env_logger::init();
  let opts = Opts::from_args();

  let bytes = fs::read(&opts.input)
    .unwrap_or_else(|e| fail("read from", &opts.input, e));
  let isx = Isx::parse(bytes).unwrap_or_else(|e| {
    die::<isx2gb::isx::Error>(e.into(), &opts.input)
  });

  let file_name = opts
    .input
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  println!("{} : {}", file_name, isx.header_text());
  println!();

  // Outputs are named after the input, minus its extension.
  let input = opts.input.to_string_lossy();
  let stem = input.strip_suffix(".isx").unwrap_or(&input).to_string();

  let layout = Layout::scan(&isx).unwrap_or_else(|e| {
    die::<isx2gb::isx::Error>(e.into(), &opts.input)
  });
  report::dump(&layout, Region::ALL, io::stdout())
    .unwrap_or_else(|e| fail("write to", Path::new("stdout"), e));

  if opts.dump {
    dump_records(&isx, &layout, &stem, &opts.input);
  } else if let Some(rom_path) = &opts.patch {
    patch_rom(&isx, &layout, rom_path, &opts.input);
  } else {
    let options = link::Options {
      fill: opts.fill,
      round: opts.round,
    };
    let rom = link::link(&isx, &layout, options)
      .unwrap_or_else(|e| die(e, &opts.input));

    let rom_path = PathBuf::from(format!("{}.{}", stem, rom.extension()));
    fs::write(&rom_path, rom.bytes())
      .unwrap_or_else(|e| fail("write", &rom_path, e));
    info!("wrote {} ({} bank(s))", rom_path.display(), rom.banks());

    if opts.hexdump {
      rom
        .dump(io::stdout())
        .unwrap_or_else(|e| fail("write to", Path::new("stdout"), e));
    }
  }

  if opts.sym {
    write_symbols(&layout, &stem);
  }

  if opts.metadata {
    let path = PathBuf::from(format!("{}.layout.json5", stem));
    let text = layout.metadata().to_json5().unwrap_or_else(|e| {
      eprintln!("error: unable to serialize layout: {}", e);
      process::exit(1)
    });
    fs::write(&path, text).unwrap_or_else(|e| fail("write", &path, e));
  }
}

/// Writes the payload of every ROM, SRAM and RAM placement to its own file.
fn dump_records(isx: &Isx, layout: &Layout, stem: &str, input: &Path) {
  link::check(layout).unwrap_or_else(|e| die(e, input));

  println!("Dumping...");
  for &region in &[Region::Rom, Region::Sram, Region::Ram] {
    for placement in layout.region(region) {
      let path = PathBuf::from(link::dump_name(stem, placement));
      fs::write(&path, placement.payload(isx.stream()))
        .unwrap_or_else(|e| fail("write", &path, e));
      println!("{}", path.display());
    }
  }
  println!();
  println!("Done!");
}

/// Applies the ROM placements to the ROM at `rom_path`, writing the result
/// next to it with a `-patched` suffix.
fn patch_rom(isx: &Isx, layout: &Layout, rom_path: &Path, input: &Path) {
  let bytes = fs::read(rom_path).unwrap_or_else(|e| fail("read from", rom_path, e));
  let mut rom = Rom::from_bytes(bytes);

  println!("Patching...");
  link::patch(isx, layout, &mut rom).unwrap_or_else(|e| die(e, input));
  for placement in layout.region(Region::Rom) {
    let plural = if placement.len == 1 { "" } else { "s" };
    println!(
      "0x{:08X}: {:5} byte{}",
      placement.addr().rom_offset(),
      placement.len,
      plural
    );
  }

  let stem = rom_path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let mut name = format!("{}-patched", stem);
  if let Some(ext) = rom_path.extension() {
    name.push('.');
    name.push_str(&ext.to_string_lossy());
  }
  let out = rom_path.with_file_name(name);
  fs::write(&out, rom.bytes()).unwrap_or_else(|e| fail("write", &out, e));
  println!();
  println!("{} has been created!", out.display());
}

fn write_symbols(layout: &Layout, stem: &str) {
  if layout.symbols().is_empty() {
    eprintln!(
      "warning: file doesn't contain any symbolic information, check your config"
    );
    return;
  }

  let path = PathBuf::from(format!("{}.sym", stem));
  let file = fs::File::create(&path).unwrap_or_else(|e| fail("create", &path, e));
  sym::write(layout.symbols(), io::BufWriter::new(file))
    .unwrap_or_else(|e| fail("write to", &path, e));
  info!("wrote {} symbols to {}", layout.symbols().len(), path.display());
}

/// Prints `errors` as diagnostics against `file` and exits.
fn die<E: error::Error>(errors: error::Errors<E>, file: &Path) -> ! {
  errors.dump_and_die(file, 1);
  process::exit(1)
}

/// Reports a failed I/O operation and exits.
fn fail(what: &str, path: &Path, e: io::Error) -> ! {
  eprintln!("error: unable to {} {}: {}", what, path.display(), e);
  process::exit(1)
}
