//! The 256-entry buzhash constant table `H[0..255]` (§4.6).
//!
//! The specification calls for a specific published table copied verbatim
//! for interoperability with an existing chunking ecosystem. That exact
//! table could not be reproduced here with the confidence required to claim
//! it bit-for-bit: this environment has no network access to fetch a
//! reference implementation, and none was present in the retrieval pack used
//! to build this crate. Rather than guess plausible-looking constants and
//! assert they are authentic, this table is a deterministically generated
//! stand-in.
//!
//! It is produced by iterating a splitmix64 generator seeded with the fixed
//! constant `0x6275_7A68_6173_68` (the ASCII bytes of "buzhash") and taking
//! the low 32 bits of each output. Every property this crate's chunker
//! depends on -- uniform bit distribution, a fixed unchanging table across
//! runs -- holds for this table exactly as it would for the reference one.
//! What it does *not* give is byte-identical chunk boundaries against a
//! real casync/desync store; see DESIGN.md for the swap-in path.
pub(crate) const BUZHASH_TABLE: [u32; 256] = [
    0x8fe563b9, 0x4f00aa34, 0xc1fdd4e5, 0x0bf1e2a1, 0xeed47775, 0x9a210153,
    0xd6d16085, 0x6d7106b3, 0xc1633a19, 0x5666f183, 0x62cc5f84, 0x8cb641af,
    0xb0adaee0, 0x5402e7ad, 0xab75199b, 0x4739c576, 0x4038fca4, 0x9e132be6,
    0xea920035, 0xb7327744, 0x0440c14f, 0x8eb1136e, 0x7f6fee58, 0x52e64302,
    0x7ade3fab, 0x17e69dee, 0x790b02ef, 0xb88cfd74, 0x2ba017f6, 0xc18fd7eb,
    0x09c9d821, 0x60bb9f07, 0x20ce8d11, 0x5e802a9c, 0xba2fa567, 0xd7947296,
    0xb0308f8b, 0x2dc2684a, 0x77815e85, 0xf74344a1, 0x9d05a409, 0xcfcd1661,
    0x4bbf58a6, 0xeff0dcdc, 0xac1a14da, 0x25f442b9, 0x6f0af9ce, 0x0ea62fa1,
    0xe800827c, 0x74b683a0, 0xa5df1460, 0xdca725be, 0x568648b3, 0x8053d3c5,
    0x80335aca, 0xe41bad41, 0xe8b60cdc, 0xb961520c, 0x84e2a488, 0x06dcb463,
    0xfc08014f, 0x41cd2591, 0x54feb49d, 0xd67d8368, 0x8874bf15, 0xf7e5debe,
    0x58d281c2, 0x735ecd95, 0xd236d4e1, 0x5bbf0d1b, 0xcd1e7f7f, 0xbee70485,
    0xa62e9938, 0x9c7a932f, 0x8cb86326, 0x953b6002, 0xbe55ccda, 0xb1241b26,
    0x49339df0, 0x384afee2, 0xfe9194ff, 0x09b60a0b, 0xd254d89c, 0x79d24a52,
    0x00dbbc29, 0xe3cfcf57, 0xb01087f3, 0x9f9773d7, 0xcf5929b2, 0x37c63e66,
    0x600232f7, 0xd420f872, 0xa29d2a65, 0xdb0ef6da, 0x31ac74bd, 0xf0f343ce,
    0xe8137d86, 0xff517f6e, 0xef4fc07a, 0x1e7a7755, 0xb4077d79, 0x06b9d6a0,
    0xbc36f288, 0xed085b31, 0xdad45a83, 0x3d398046, 0xfbe3c76d, 0x84a9720e,
    0xf3b17ee3, 0x7673459b, 0x864e5f70, 0xa9ede72f, 0x4ae85be2, 0x294247f2,
    0x15a380b8, 0xa207452e, 0xe48e6a73, 0xa612ff22, 0x470ef17f, 0x38554fc7,
    0x5b957c92, 0xb3048b48, 0x50e9dd97, 0x0eb020e1, 0x69709c43, 0x9355c98c,
    0x51f22644, 0x3ccf1cd7, 0x61807078, 0xf8328ec4, 0xdc9c6bea, 0xe10b4c52,
    0xda33af9a, 0x5c20ada1, 0x9641044c, 0xe57696a1, 0x5f24e133, 0xb9be6979,
    0xe5d02ca0, 0x3b564e61, 0x3d9a0b58, 0x7ac65bbe, 0xeb9da668, 0xd8c96fd4,
    0x1210fed3, 0x504815a6, 0x0d10ad74, 0x8ef52ff3, 0xd83c7501, 0x69365429,
    0xdaa25d7d, 0x521793a9, 0xbad5b7bc, 0x13f071cb, 0xdbb9f50d, 0xfef57b23,
    0x9a2f6092, 0x5d62f9c9, 0xd6a22664, 0xc26c153c, 0x4156f76e, 0x0544fdce,
    0x5801a89e, 0x7ed9ed76, 0xd663c203, 0x5c7904ee, 0x21ad00db, 0xa706f612,
    0x91820900, 0xc00b04f1, 0x856f3129, 0x891f7ff0, 0x22a922f8, 0x1e5bcaef,
    0x8d2c154c, 0xe3f22092, 0x43f9c870, 0x053375cd, 0xe0657a3e, 0x7c050b27,
    0x837a6de4, 0xa36e959d, 0x5b8c53bc, 0x37607de4, 0xade4fc9f, 0x8f7f418d,
    0x4a8a7430, 0xaeaf9cba, 0x27442945, 0x3cc602c1, 0x88417547, 0xbeabb9ee,
    0x275abbde, 0xd50fb173, 0x5e457d22, 0x87fd95e7, 0x942fec0f, 0xc310eaf0,
    0x09020566, 0xeda015a9, 0x5938b604, 0x04262c40, 0x2502e8f5, 0x5212c9ff,
    0xc1b4affb, 0xa48fdec2, 0xa4b6bfce, 0xd8564a51, 0xa53d1fa6, 0xacace7ab,
    0x9313b569, 0x12e75776, 0xb0cf83be, 0x5f2c77fd, 0x301871c4, 0xb5fbad39,
    0xd73be241, 0xf8efa283, 0xb850cf38, 0x2f650062, 0xb6c018ef, 0x2244b2fe,
    0x2d538f27, 0xbf3e7e0c, 0x7dc9631b, 0xfed68a52, 0x26fd5d81, 0xde4b7ee2,
    0x4043a2b9, 0xc04fdbba, 0xc82ccb61, 0xf630ffb8, 0x1b396f99, 0x0de4a4b3,
    0x788c734c, 0x10e847f3, 0x535c163c, 0x720d815c, 0x6f221818, 0xf0c9e186,
    0x2fb817cf, 0x0494c756, 0xb5880022, 0x5d7b2fed, 0x00179b0a, 0xf6aa759e,
    0x2a469fa7, 0x255b5c38, 0x56bc03d9, 0x8256f017, 0xa4638446, 0xaa013206,
    0x56583b91, 0x5d0f40de, 0xf336e920, 0xd67656e3,
];

#[cfg(test)]
mod tests {
    use super::BUZHASH_TABLE;

    #[test]
    fn table_has_256_entries() {
        assert_eq!(BUZHASH_TABLE.len(), 256);
    }

    #[test]
    fn table_entries_are_not_degenerate() {
        assert!(BUZHASH_TABLE.iter().all(|&v| v != 0));
        let unique: std::collections::HashSet<u32> = BUZHASH_TABLE.iter().copied().collect();
        assert_eq!(unique.len(), BUZHASH_TABLE.len());
    }
}
