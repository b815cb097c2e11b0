use thai_idcard::constants::THAI_ID_AID;
use thai_idcard::protocol::codec::encode_command;
use thai_idcard::protocol::{Command, GetResponseVariant};

fn hex_bytes(s: &str) -> Vec<u8> {
    hex::decode(s).expect("valid hex literal")
}

#[test]
fn select_applet_matches_reference_bytes() {
    let cmd = Command::SelectApplet {
        aid: THAI_ID_AID.to_vec(),
    };
    assert_eq!(encode_command(&cmd), hex_bytes("00a4040008a000000054480001"));
}

#[test]
fn read_binary_uses_proprietary_class() {
    // CID: 13 bytes at 0x0004
    let cmd = Command::ReadBinary {
        offset: 0x0004,
        length: 0x0D,
    };
    assert_eq!(encode_command(&cmd), hex_bytes("80b0000402000d"));
    assert_eq!(cmd.to_apdu().expected_len, 13);

    // address at 0x1579
    let cmd = Command::ReadBinary {
        offset: 0x1579,
        length: 0x64,
    };
    assert_eq!(encode_command(&cmd), hex_bytes("80b01579020064"));
}

#[test]
fn get_response_p2_follows_variant() {
    let standard = Command::GetResponse {
        variant: GetResponseVariant::Standard,
        length: 0xFF,
    };
    let alternate = Command::GetResponse {
        variant: GetResponseVariant::Alternate,
        length: 0xFF,
    };
    assert_eq!(encode_command(&standard), hex_bytes("00c00000ff"));
    assert_eq!(encode_command(&alternate), hex_bytes("00c00001ff"));
}

#[test]
fn variant_is_chosen_from_atr_prefix() {
    assert_eq!(
        GetResponseVariant::from_atr(&hex_bytes("3b67000000732d203600789000")),
        GetResponseVariant::Alternate
    );
    assert_eq!(
        GetResponseVariant::from_atr(&hex_bytes("3b6800000073c84012009000")),
        GetResponseVariant::Standard
    );
}
