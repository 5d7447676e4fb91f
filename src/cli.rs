use clap::{value_parser, crate_version, Arg, ArgAction, Command, ValueHint};

const IN_HELP: &str = "paths inside the image use `/` to separate MyDOS subdirectories, e.g. `GAMES/FROGS.COM`";
const SEC_HELP: &str = "with `-t sec` the path is a sector number, or a range like `361..369`";
const T_LONG_HELP: &str = "The `file` type is an ordinary DOS file, found through the directory.
The `sec` type is a raw sector, found by number, the file system is not consulted.";
const K_LONG_HELP: &str = "sd = 720 sectors of 128 bytes
ed = 1040 sectors of 128 bytes (DOS 2.5)
dd = 720 sectors of 256 bytes
<count>x<length> gives any geometry, e.g. 4096x256 (MyDOS only beyond 1040 sectors)
auto = smallest disk that holds the source directory (mkatr only)";
const PICO_LONG_HELP: &str = "PICONAME.TXT maps 8.3 names back to host names for MyPicoDos.
auto = write it only if some host name could not be kept as is";

fn file_arg(help: &'static str, req: bool, shell_hint: bool) -> Arg {
    let ans = Arg::new("file").short('f').long("file").value_name("PATH").required(req).help(help);
    if shell_hint {
        ans.value_hint(ValueHint::FilePath)
    } else {
        ans
    }
}

fn indent_arg() -> Arg {
    Arg::new("indent").long("indent").help("JSON indentation, omit to minify")
        .value_name("SPACES")
        .value_parser(value_parser!(u16).range(0..16))
        .required(false)
}

fn dimg_arg(req: bool) -> Arg {
    Arg::new("dimg").short('d').long("dimg").help("path to disk image itself")
        .value_name("PATH")
        .value_hint(ValueHint::FilePath)
        .required(req)
}

fn source_arg() -> Arg {
    Arg::new("source").short('s').long("source").help("host directory to copy from")
        .value_name("DIR")
        .value_hint(ValueHint::DirPath)
        .required(true)
}

fn os_arg(os_names: [&'static str;2]) -> Arg {
    Arg::new("os").long("os").short('o').help("operating system format").value_name("OS")
        .required(false)
        .value_parser(os_names)
        .default_value("dos2")
}

fn boot_arg() -> Arg {
    Arg::new("boot").long("boot").short('b').help("boot sectors to install").value_name("BOOT")
        .required(false)
        .default_value("none")
        .long_help("Boot sectors that load the named DOS file from the root directory,
e.g. dos20, dos25, mydos455, picodos405, or none.
Only dos20 and none are built in, the others are read from --boot-lib.
If the DOS file or the boot image is missing the default boot sectors are used.")
}

fn bootlib_arg() -> Arg {
    Arg::new("bootlib").long("boot-lib").help("directory of boot sector images").value_name("PATH")
        .required(false)
        .value_hint(ValueHint::DirPath)
        .long_help("Directory with boot sectors taken from real disks, named after the boot type,
e.g. mydos455.boot (384 bytes) or mydos455.atr (first three sectors are used).
An autorun version is named e.g. picodos405.autorun.boot.
Only dos20 and none are built in.")
}

fn piconame_arg() -> Arg {
    Arg::new("piconame").long("piconame").help("when to write PICONAME.TXT").value_name("WHEN")
        .required(false)
        .value_parser(["never","auto","always"])
        .default_value("auto")
        .long_help(PICO_LONG_HELP)
}

pub fn build_cli() -> Command {
    let long_help = "a8kit is always invoked with exactly one of several subcommands.
The subcommands are generally designed to function as nodes in a pipeline.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
create DOS 2.5 image:  `a8kit mkdsk -o dos2 -k ed -d blank.atr`
create MyDOS image:    `a8kit mkdsk -o mydos -k 4096x256 -d big.atr`
image from directory:  `a8kit mkatr -s ./games -o mydos -b mydos455 -d games.atr`
list the directory:    `a8kit catalog -d games.atr`
copy a file out:       `a8kit get -f ACTION/FROGS.COM -d games.atr > frogs.com`
copy a file in:        `a8kit put -f README.TXT -d games.atr < readme.txt`
look at the VTOC:      `a8kit get -t sec -f 360 -d games.atr`";

    let os_names = ["dos2","mydos"];
    let get_put_types = ["file","sec"];

    let mut main_cmd = Command::new("a8kit")
        .about("Atari 8-bit disk images and virtual drives for DOS 2.x and MyDOS.")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("mkdsk")
            .arg(os_arg(os_names))
            .arg(Arg::new("kind").long("kind").short('k').help("kind of disk").value_name("KIND")
                .required(false)
                .default_value("sd")
                .long_help(K_LONG_HELP)
            )
            .arg(boot_arg())
            .arg(bootlib_arg())
            .arg(dimg_arg(true))
            .arg(Arg::new("force").long("force").help("overwrite an existing image").action(ArgAction::SetTrue))
            .about("write a blank, formatted disk image")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("mkatr")
            .arg(source_arg())
            .arg(os_arg(os_names))
            .arg(Arg::new("kind").long("kind").short('k').help("kind of disk").value_name("KIND")
                .required(false)
                .default_value("auto")
                .long_help(K_LONG_HELP)
            )
            .arg(boot_arg())
            .arg(bootlib_arg())
            .arg(Arg::new("autorun").long("autorun").help("MyPicoDos runs the first file on boot").action(ArgAction::SetTrue))
            .arg(piconame_arg())
            .arg(dimg_arg(true))
            .arg(Arg::new("force").long("force").help("overwrite an existing image").action(ArgAction::SetTrue))
            .about("build a disk image from a host directory")
            .after_help("subdirectories are copied only for MyDOS")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("estimate")
            .arg(source_arg())
            .arg(os_arg(os_names))
            .arg(Arg::new("len").long("len").short('l').help("sector length in bytes").value_name("BYTES")
                .required(false)
                .value_parser(["128","256"])
                .default_value("256")
            )
            .arg(boot_arg())
            .arg(piconame_arg())
            .about("estimate the sectors needed to hold a host directory")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("get")
            .arg(file_arg("path inside disk image, or sector",true,false))
            .arg(Arg::new("type").long("type").short('t').help("type of the item")
                .value_name("TYPE").required(false).value_parser(get_put_types).default_value("file")
                .long_help(T_LONG_HELP)
            )
            .arg(dimg_arg(true))
            .arg(Arg::new("console").long("console").help("format for console unconditionally")
                .action(ArgAction::SetTrue)
                .long_help("even if the output context is a file or pipe, format it for the console"))
            .about("read from disk image, write to stdout")
            .after_help([IN_HELP,"\n",SEC_HELP].concat())
    );
    main_cmd = main_cmd.subcommand(
        Command::new("put")
            .arg(file_arg("path inside disk image, or sector",true,false))
            .arg(Arg::new("type").long("type").short('t').help("type of the item")
                .value_name("TYPE").required(false).value_parser(get_put_types).default_value("file")
                .long_help(T_LONG_HELP)
            )
            .arg(dimg_arg(true))
            .arg(Arg::new("mirror").long("mirror").help("host directory bound to the image root").value_name("DIR")
                .value_hint(ValueHint::DirPath)
                .required(false))
            .about("read from stdin, write to disk image")
            .after_help([IN_HELP,"\n",SEC_HELP,
                "\nwith `--mirror` sector writes that change a directory are carried over to the host"].concat())
    );
    main_cmd = main_cmd.subcommand(
        Command::new("catalog")
            .arg(file_arg("directory inside disk image",false,false))
            .arg(dimg_arg(true))
            .arg(Arg::new("filter").long("filter").help("only list names matching a glob").value_name("GLOB")
                .required(false))
            .arg(Arg::new("json").long("json").help("output JSON").action(ArgAction::SetTrue))
            .arg(indent_arg())
            .visible_alias("ls")
            .visible_alias("dir")
            .about("list the directory of a disk image")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("completions")
            .arg(Arg::new("shell").short('s').long("shell").help("shell type").value_name("SHELL")
                .required(true)
                .value_parser(["bash","elv","fish","ps1","zsh"]))
            .about("write shell completion script to stdout")
    );
    main_cmd
}
