//! m68k CLI

use m68k::{AddressBus, Config, Emulator};

fn main() {
    env_logger::init();

    println!("m68k - dynamic binary translation runtime");
    println!("==========================================\n");

    let mut em = Emulator::new(Config::default());
    em.cpu.set_sp(0x0010_0000);

    // MOVE.L #$2A,D0 ; JSR exit_emulator
    em.memory.write_word(0x1000, 0x203C);
    em.memory.write_long(0x1002, 0x2A);
    em.memory.write_word(0x1006, 0x4EB9);
    em.memory
        .write_long(0x1008, m68k::magic::EXIT_EMULATOR_ADDRESS);

    println!("CPU type: {:?}", em.cpu.cpu_type);
    let reason = em.execute(0x1000);
    println!("D0 after run: ${:08X}", em.cpu.d(0));
    println!("exit reason: {:?}", reason);
}
