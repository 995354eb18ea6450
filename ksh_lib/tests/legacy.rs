use ksh_lib::{
    AnalyzeError, BuildError, ErrorKind, KshDocument, KshFormat, Preserved, ShaderRole,
    ShaderSection, analyze_legacy, build,
    error::{EncodingIssue, FormatError, UniformIssue},
    legacy::{LegacyLayout, UniformType},
};

#[macro_use]
mod common;

use common::{legacy_bytes, string, words};

fn legacy(document: &KshDocument) -> &LegacyLayout {
    match &document.preserved {
        Preserved::Legacy(layout) => layout,
        Preserved::Container(_) => panic!("expected a legacy file"),
    }
}

#[test]
fn analyze_legacy_file() {
    let format = KshFormat::default();
    let bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));

    let document = KshDocument::from_bytes(&format, &bytes).unwrap();
    assert_eq!(ShaderSection::vertex("anim.vs", "VS_SRC"), document.vs);
    assert_eq!(ShaderSection::pixel("anim.ps", "PS_SRC"), document.ps);

    let layout = legacy(&document);
    assert_eq!("anim", layout.file_name());
    assert_eq!(2, layout.uniforms().len());
    assert_eq!(UniformType::Vec4, layout.uniforms()[0].data_type);
    assert_eq!(
        vec![0, 0, 0, 0x3f800000],
        layout.uniforms()[0].default_data.as_ref().unwrap().values
    );
    assert_eq!(UniformType::Sampler2D, layout.uniforms()[1].data_type);
    assert_eq!(None, layout.uniforms()[1].default_data);
    assert_eq!(vec!["a"], layout.uniform_names(ShaderRole::Vertex));
    assert_eq!(vec!["a", "b"], layout.uniform_names(ShaderRole::Pixel));
}

#[test]
fn legacy_round_trip() {
    let format = KshFormat::default();
    let bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    let document = analyze_legacy(&format, &bytes).unwrap();
    assert_hex_eq!(&bytes, document.to_bytes(&format).unwrap());
}

#[test]
fn legacy_trailing_bytes_round_trip() {
    let format = KshFormat::default();
    let mut bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    bytes.extend_from_slice(&[1, 2, 3]);
    let document = analyze_legacy(&format, &bytes).unwrap();
    assert_hex_eq!(&bytes, document.to_bytes(&format).unwrap());
}

#[test]
fn legacy_edit_vertex_shader() {
    let format = KshFormat::default();
    let bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    let document = analyze_legacy(&format, &bytes).unwrap();

    let vs = ShaderSection::vertex("anim.vs", "VS_SRC_V2");
    let edited = build(&format, &document.preserved, &vs, &document.ps).unwrap();
    assert_hex_eq!(
        legacy_bytes(("anim.vs", "VS_SRC_V2"), ("anim.ps", "PS_SRC")),
        &edited
    );
    assert_eq!(
        legacy(&document).uniforms(),
        legacy(&analyze_legacy(&format, &edited).unwrap()).uniforms()
    );
}

#[test]
fn new_legacy_document() {
    let format = KshFormat::default();
    let document = KshDocument::new_legacy(
        "anim",
        ShaderSection::vertex("anim.vs", "VS"),
        ShaderSection::pixel("anim.ps", "PS"),
    );
    let expected = [
        string("anim"),
        words(&[0]),
        string("anim.vs"),
        words(&[3]),
        b"VS\0".to_vec(),
        string("anim.ps"),
        words(&[3]),
        b"PS\0".to_vec(),
        words(&[0, 0]),
    ]
    .concat();
    assert_hex_eq!(expected, document.to_bytes(&format).unwrap());
}

#[test]
fn legacy_uniform_index_out_of_range() {
    let mut bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&5u32.to_le_bytes());
    assert!(matches!(
        analyze_legacy(&KshFormat::default(), &bytes),
        Err(AnalyzeError::Format(FormatError::UniformIndex {
            role: ShaderRole::Pixel,
            index: 5,
            count: 2
        }))
    ));
}

#[test]
fn legacy_missing_terminator() {
    let bytes = [
        string("anim"),
        words(&[0]),
        string("anim.vs"),
        words(&[1]),
        b"a".to_vec(),
    ]
    .concat();
    assert!(matches!(
        analyze_legacy(&KshFormat::default(), &bytes),
        Err(AnalyzeError::Format(FormatError::MissingTerminator {
            role: ShaderRole::Vertex
        }))
    ));
}

#[test]
fn legacy_truncated_files() {
    let format = KshFormat::default();
    let bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    for len in 0..bytes.len() {
        let error = analyze_legacy(&format, &bytes[..len]).unwrap_err();
        assert_eq!(ErrorKind::Format, error.kind(), "length {len}");
    }
}

#[test]
fn legacy_name_length_limit() {
    let format = KshFormat {
        max_name_len: 4,
        ..Default::default()
    };
    let bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    assert!(matches!(
        analyze_legacy(&format, &bytes),
        Err(AnalyzeError::Format(FormatError::NameTooLong {
            role: ShaderRole::Vertex,
            len: 7,
            max: 4
        }))
    ));
}

#[test]
fn legacy_interior_nul() {
    let format = KshFormat::default();
    let error = build(
        &format,
        &Preserved::legacy("anim"),
        &ShaderSection::vertex("anim.vs", "VS"),
        &ShaderSection::pixel("anim.ps", "P\0S"),
    )
    .unwrap_err();
    assert_eq!(ErrorKind::Encoding, error.kind());
    assert!(matches!(
        error,
        BuildError::Encoding(e) if e.issue == EncodingIssue::InteriorNul && e.position == 1
    ));

    // The stored length includes the first NUL.
    let mut bytes = legacy_bytes(("anim.vs", "VS_SRC"), ("anim.ps", "PS_SRC"));
    let position = bytes.windows(6).position(|w| w == b"PS_SRC").unwrap();
    bytes[position + 2] = 0;
    assert!(matches!(
        analyze_legacy(&format, &bytes),
        Err(AnalyzeError::Encoding(e)) if e.issue == EncodingIssue::InteriorNul
    ));
}

#[test]
fn legacy_uniform_name_past_end() {
    let bytes = [
        string("anim"),
        words(&[1, 0xfffffff0]),
        vec![0; 16],
    ]
    .concat();
    let error = analyze_legacy(&KshFormat::default(), &bytes).unwrap_err();
    assert!(matches!(
        error,
        AnalyzeError::Format(FormatError::Uniform {
            index: 0,
            position: 12,
            reason: UniformIssue::UnexpectedEnd
        })
    ));
    assert_eq!(
        "invalid file: invalid uniform 0 at byte 12: unexpected end of data",
        error.to_string()
    );
}

#[test]
fn legacy_uniform_unknown_type() {
    let bytes = [
        string("anim"),
        words(&[2]),
        string("a"),
        words(&[0, 4, 1, 4, 0, 0, 0, 0]),
        string("b"),
        words(&[0, 5, 1, 1, 0]),
    ]
    .concat();
    assert!(matches!(
        analyze_legacy(&KshFormat::default(), &bytes),
        Err(AnalyzeError::Format(FormatError::Uniform {
            index: 1,
            position: 49,
            reason: UniformIssue::UnknownValue
        }))
    ));
}

#[test]
fn legacy_uniform_too_many_default_values() {
    let bytes = [
        string("anim"),
        words(&[1]),
        string("a"),
        words(&[0, 0, 1, 100_000]),
        vec![0; 16],
    ]
    .concat();
    assert!(matches!(
        analyze_legacy(&KshFormat::default(), &bytes),
        Err(AnalyzeError::Format(FormatError::Uniform {
            index: 0,
            position: 12,
            reason: UniformIssue::TooManyDefaultValues
        }))
    ));
}
