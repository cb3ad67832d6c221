//! 2C02 master palette.

/// The 64 colors the PPU can emit, as 0RGB words.
#[rustfmt::skip]
pub const MASTER_PALETTE: [u32; 64] = [
    0x00666666, 0x00002A88, 0x001412A7, 0x003B00A4, 0x005C007E, 0x006E0040, 0x006C0600, 0x00561D00,
    0x00333500, 0x000B4800, 0x00005200, 0x00004F08, 0x0000404D, 0x00000000, 0x00000000, 0x00000000,
    0x00ADADAD, 0x00155FD9, 0x004240FF, 0x007527FE, 0x00A01ACC, 0x00B71E7B, 0x00B53120, 0x00994E00,
    0x006B6D00, 0x00388700, 0x000C9300, 0x00008F32, 0x00007C8D, 0x00000000, 0x00000000, 0x00000000,
    0x00FFFEFF, 0x0064B0FF, 0x009290FF, 0x00C676FF, 0x00F36AFF, 0x00FE6ECC, 0x00FE8170, 0x00EA9E22,
    0x00BCBE00, 0x0088D800, 0x005CE430, 0x0045E082, 0x0048CDDE, 0x004F4F4F, 0x00000000, 0x00000000,
    0x00FFFEFF, 0x00C0DFFF, 0x00D3D2FF, 0x00E8C8FF, 0x00FBC2FF, 0x00FEC4EA, 0x00FECCC5, 0x00F7D8A5,
    0x00E4E594, 0x00CFEF96, 0x00BDF4AB, 0x00B3F3CC, 0x00B5EBF2, 0x00B8B8B8, 0x00000000, 0x00000000,
];
