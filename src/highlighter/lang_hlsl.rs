// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HLSL, plus the keywords SDSL adds on top of it.

use super::TokenCategory::{
    BuiltIn, Comment, Keyword, Literal, Meta, Number, Symbol, TitleFunction, Type,
};
use super::modes::*;
use super::*;
use crate::apperr;
use crate::registry::LanguageRegistry;

pub const NAME: &str = "hlsl";
pub const ALIAS: &str = "sdsl";

pub const EXTENSIONS: &[&str] = &["hlsl", "hlsli", "fx", "fxh", "sdsl", "sdfx"];

pub const BASE_TYPES: &[&str] = &[
    "bool",
    "double",
    "float",
    "half",
    "int",
    "uint",
    "min16float",
    "min10float",
    "min16int",
    "min12int",
    "min16uint",
];

const OBJECT_TYPES: &str = "\
    void vector matrix string dword \
    Buffer StructuredBuffer RWBuffer RWStructuredBuffer ByteAddressBuffer RWByteAddressBuffer \
    AppendStructuredBuffer ConsumeStructuredBuffer \
    Texture1D Texture1DArray Texture2D Texture2DArray Texture2DMS Texture2DMSArray Texture3D \
    TextureCube TextureCubeArray \
    RWTexture1D RWTexture1DArray RWTexture2D RWTexture2DArray RWTexture3D \
    SamplerState SamplerComparisonState sampler texture \
    InputPatch OutputPatch TriangleStream LineStream PointStream \
    VertexShader PixelShader GeometryShader HullShader DomainShader ComputeShader";

const FUNCTIONS: &str = "\
    abs acos all AllMemoryBarrier AllMemoryBarrierWithGroupSync any asdouble asfloat asin asint \
    asuint atan atan2 \
    ceil CheckAccessFullyMapped clamp clip cos cosh countbits cross \
    D3DCOLORtoUBYTE4 ddx ddx_coarse ddx_fine ddy ddy_coarse ddy_fine degrees determinant \
    DeviceMemoryBarrier DeviceMemoryBarrierWithGroupSync distance dot dst \
    EvaluateAttributeAtCentroid EvaluateAttributeAtSample EvaluateAttributeSnapped exp exp2 \
    f16tof32 f32tof16 faceforward firstbithigh firstbitlow floor fma fmod frac frexp fwidth \
    GetRenderTargetSampleCount GetRenderTargetSamplePosition GroupMemoryBarrier \
    GroupMemoryBarrierWithGroupSync \
    InterlockedAdd InterlockedAnd InterlockedCompareExchange InterlockedCompareStore \
    InterlockedExchange InterlockedMax InterlockedMin InterlockedOr InterlockedXor \
    isfinite isinf isnan ldexp length lerp lit log log10 log2 \
    mad max min modf msad4 mul noise normalize pow \
    radians rcp reflect refract reversebits round rsqrt saturate sign sin sincos sinh smoothstep \
    sqrt step \
    tan tanh tex1D tex1Dbias tex1Dgrad tex1Dlod tex1Dproj tex2D tex2Dbias tex2Dgrad tex2Dlod \
    tex2Dproj tex3D tex3Dbias tex3Dgrad tex3Dlod tex3Dproj texCUBE texCUBEbias texCUBEgrad \
    texCUBElod texCUBEproj transpose trunc \
    Sample SampleLevel SampleGrad SampleCmp SampleCmpLevelZero Load Store GetDimensions";

const KEYWORDS: &str = "\
    break case continue default discard do else for if return switch while \
    struct class interface namespace typedef \
    cbuffer tbuffer technique technique10 technique11 pass \
    in out inout uniform const static extern inline \
    register packoffset \
    linear centroid nointerpolation noperspective sample \
    row_major column_major \
    precise groupshared shared volatile \
    export compile compile_fragment \
    shader stage stream streams compose override clone base mixin";

const LITERALS: &str = "true false NULL";

const DIRECTIVES: &str =
    "define undef if ifdef ifndef else elif endif include pragma line error warning";

/// `""` for scalars, `"1"`..`"4"` for vectors, `"1x1"`..`"4x4"` for matrices.
pub fn dimension_suffixes() -> Vec<String> {
    let mut suffixes = Vec::with_capacity(21);
    suffixes.push(String::new());
    for n in 1..=4 {
        suffixes.push(n.to_string());
    }
    for rows in 1..=4 {
        for cols in 1..=4 {
            suffixes.push(format!("{rows}x{cols}"));
        }
    }
    suffixes
}

/// Every base name followed by every suffix, base-major.
pub fn expand_type_names<B, S>(bases: &[B], suffixes: &[S]) -> Vec<String>
where
    B: AsRef<str>,
    S: AsRef<str>,
{
    let mut names = Vec::with_capacity(bases.len() * suffixes.len());
    for base in bases {
        for suffix in suffixes {
            names.push(format!("{}{}", base.as_ref(), suffix.as_ref()));
        }
    }
    names
}

pub fn type_keywords() -> KeywordSet {
    let mut set = KeywordSet::from_list(Type, OBJECT_TYPES);
    set.words.extend(expand_type_names(BASE_TYPES, &dimension_suffixes()));
    set
}

fn number() -> TokenRule {
    TokenRule::variants(
        Number,
        &[
            r"\b0[xX][a-fA-F0-9]+[uUlL]?",
            r"\b\d+\.\d*([eE][-+]?\d+)?[fFhHlL]?",
            r"\b\.\d+([eE][-+]?\d+)?[fFhHlL]?",
            r"\b\d+([eE][-+]?\d+)?[fFhHlL]?",
            r"\b\d+[uUlL]?",
        ],
    )
    .with_relevance(0)
}

fn preprocessor() -> TokenRule {
    TokenRule::new(r"#\s*[a-z]+\b")
        .with_end("$")
        .with_category(Meta)
        .with_keywords(vec![KeywordSet::from_list(Keyword, DIRECTIVES)])
        .with_contains(vec![
            // Line continuation.
            TokenRule::new(r"\\\r?\n").with_relevance(0),
            c_line_comment(),
            c_block_comment(),
            quote_string(),
            TokenRule::new("<")
                .with_end(">")
                .with_category(TokenCategory::String)
                .with_illegal(r"\r?\n"),
        ])
}

/// `: SV_Target`, `: TEXCOORD0` and friends. A colon followed by anything else is left alone,
/// so class inheritance (`: Base`) doesn't match.
fn semantic() -> TokenRule {
    TokenRule::new(
        r":\s*(SV_\w+|POSITION\d*|NORMAL\d*|TEXCOORD\d*|COLOR\d*|TANGENT\d*|BINORMAL\d*|BLENDWEIGHT\d*|BLENDINDICES\d*|PSIZE\d*|TESSFACTOR\d*|DEPTH\d*|FOG|VFACE|VPOS|POSITIONT)\b",
    )
    .with_category(Symbol)
    .with_relevance(10)
}

fn entry_point() -> TokenRule {
    TokenRule::new(r"\b(VSMain|PSMain|GSMain|HSMain|DSMain|CSMain)\b").with_category(TitleFunction)
}

pub fn grammar() -> GrammarDefinition {
    GrammarDefinition {
        name: "HLSL".to_string(),
        case_insensitive: false,
        extensions: EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        keywords: vec![
            KeywordSet::from_list(Keyword, KEYWORDS),
            type_keywords(),
            KeywordSet::from_list(BuiltIn, FUNCTIONS),
            KeywordSet::from_list(Literal, LITERALS),
        ],
        rules: vec![
            c_line_comment(),
            c_block_comment(),
            preprocessor(),
            quote_string(),
            number(),
            semantic(),
            entry_point(),
        ],
    }
}

/// Registers the grammar as `hlsl` and as `sdsl`.
pub fn register(registry: &mut impl LanguageRegistry) -> apperr::Result<()> {
    let grammar = grammar();
    registry.register_language(NAME, grammar.clone())?;
    registry.register_language(ALIAS, grammar)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const SHADER: &str = r#"#include "common.hlsli"
#define TILE_SIZE 16

cbuffer PerFrame : register(b0)
{
    float4x4 ViewProjection;
    float3 LightDir;
};

Texture2D Albedo : register(t0);
SamplerState LinearSampler : register(s0);

struct VSInput
{
    float3 position : POSITION;
    float2 uv : TEXCOORD0;
};

struct PSInput
{
    float4 position : SV_Position;
    float2 uv : TEXCOORD0;
};

PSInput VSMain(VSInput input)
{
    PSInput output;
    output.position = mul(float4(input.position, 1.0f), ViewProjection);
    output.uv = input.uv;
    return output;
}

/* Lambert only. */
float4 PSMain(PSInput input) : SV_Target
{
    float3 albedo = Albedo.Sample(LinearSampler, input.uv).rgb;
    return float4(albedo * saturate(dot(LightDir, float3(0, 1, 0))), 1.0);
}
"#;

    fn spans(src: &str) -> Vec<(TokenCategory, &str)> {
        let lang = Language::compile(grammar()).unwrap();
        lang.highlight(src).tokens.iter().map(|t| (t.category, t.text(src))).collect()
    }

    fn highlight(src: &str) -> HighlightResult {
        Language::compile(grammar()).unwrap().highlight(src)
    }

    #[test]
    fn test_dimension_suffixes() {
        let suffixes = dimension_suffixes();
        assert_eq!(suffixes.len(), 21);
        assert_eq!(&suffixes[..6], ["", "1", "2", "3", "4", "1x1"]);
        assert_eq!(suffixes[20], "4x4");
    }

    #[test]
    fn test_expand_type_names() {
        let suffixes = dimension_suffixes();
        let names = expand_type_names(BASE_TYPES, &suffixes);
        assert_eq!(names.len(), BASE_TYPES.len() * 21);

        for base in BASE_TYPES {
            for suffix in &suffixes {
                let name = format!("{base}{suffix}");
                assert_eq!(names.iter().filter(|n| **n == name).count(), 1, "{name}");
            }
        }

        assert_eq!(expand_type_names(&["a", "b"], &["", "1"]), ["a", "a1", "b", "b1"]);
    }

    #[test]
    fn test_type_set_size() {
        let generated: HashSet<String> =
            expand_type_names(BASE_TYPES, &dimension_suffixes()).into_iter().collect();
        let objects = KeywordSet::from_list(Type, OBJECT_TYPES);

        assert_eq!(objects.len(), 42);
        assert!(objects.words.iter().all(|w| !generated.contains(w)));
        assert_eq!(type_keywords().len(), BASE_TYPES.len() * 21 + 42);

        let g = grammar();
        let types = g.keyword_set(Type).unwrap();
        assert!(types.contains("float3x4"));
        assert!(types.contains("min16uint2x1"));
        assert!(types.contains("RWStructuredBuffer"));
    }

    #[test]
    fn test_rule_order() {
        let rules = grammar().rules;
        assert_eq!(rules.len(), 7);
        assert_eq!(rules[0], c_line_comment());
        assert_eq!(rules[1], c_block_comment());
        assert_eq!(rules[2].category, Some(Meta));
        assert_eq!(rules[3], quote_string());
        assert_eq!(rules[4].category, Some(Number));
        assert_eq!(rules[4].relevance, Some(0));
        assert_eq!(rules[5].category, Some(Symbol));
        assert_eq!(rules[5].relevance, Some(10));
        assert_eq!(rules[6].category, Some(TitleFunction));
        assert_eq!(rules[6].relevance, None);
    }

    #[test]
    fn test_matrix_type() {
        assert_eq!(spans("float3x4 x;"), [(Type, "float3x4")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(spans("1.5e-3f"), [(Number, "1.5e-3f")]);
        assert_eq!(spans("x = 0x1Fu;"), [(Number, "0x1Fu")]);
        assert_eq!(spans("half h = 3.0h;"), [(Type, "half"), (Number, "3.0h")]);
        assert_eq!(spans("a[12]"), [(Number, "12")]);
        assert_eq!(highlight("1.5e-3f 2 3").relevance, 0);
    }

    #[test]
    fn test_semantics() {
        let result = highlight(": SV_Position");
        assert_eq!(result.tokens, [Token { category: Symbol, range: 0..13 }]);
        assert_eq!(result.relevance, 10);

        let result = highlight(": BaseClass");
        assert_eq!(result.tokens_of(Symbol).count(), 0);
        assert_eq!(result.relevance, 0);

        assert_eq!(
            spans("float2 uv : TEXCOORD0;"),
            [(Type, "float2"), (Symbol, ": TEXCOORD0")]
        );
        assert_eq!(spans("float4 p:POSITIONT;"), [(Type, "float4"), (Symbol, ":POSITIONT")]);
        assert_eq!(spans("shader Lit : ShaderBase"), [(Keyword, "shader")]);
    }

    #[test]
    fn test_entry_point() {
        assert_eq!(spans("void PSMain() {}"), [(Type, "void"), (TitleFunction, "PSMain")]);
        assert_eq!(spans("void PSMainHelper() {}"), [(Type, "void")]);
    }

    #[test]
    fn test_keyword_categories() {
        assert_eq!(
            spans("return saturate(x) ? true : NULL;"),
            [(Keyword, "return"), (BuiltIn, "saturate"), (Literal, "true"), (Literal, "NULL")]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(spans("// float\nfloat"), [(Comment, "// float"), (Type, "float")]);
        assert_eq!(spans("int /* a\nb */ i;"), [(Type, "int"), (Comment, "/* a\nb */")]);
    }

    #[test]
    fn test_preprocessor() {
        assert_eq!(
            spans("#define FOO 1"),
            [(Meta, "#"), (Keyword, "define"), (Meta, " FOO 1")]
        );
        assert_eq!(
            spans("#include <foo.hlsl>"),
            [(Meta, "#"), (Keyword, "include"), (Meta, " "), (TokenCategory::String, "<foo.hlsl>")]
        );
        assert_eq!(
            spans("#include \"foo.hlsl\" // bar"),
            [
                (Meta, "#"),
                (Keyword, "include"),
                (Meta, " "),
                (TokenCategory::String, "\"foo.hlsl\""),
                (Meta, " "),
                (Comment, "// bar"),
            ]
        );
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(
            spans("#define A \\\n  B\nint"),
            [(Meta, "#"), (Keyword, "define"), (Meta, " A \\\n  B"), (Type, "int")]
        );
    }

    #[test]
    fn test_unterminated_include() {
        let src = "#include <foo\nint x;";
        let result = highlight(src);
        assert!(result.illegal);
        let spans: Vec<_> = result.tokens.iter().map(|t| (t.category, t.text(src))).collect();
        assert_eq!(
            spans,
            [(Meta, "#"), (Keyword, "include"), (Meta, " "), (TokenCategory::String, "<foo"), (Type, "int")]
        );
    }

    #[test]
    fn test_unterminated_include_crlf() {
        let src = "#include <foo\r\nint x;\r\n";
        let result = highlight(src);
        assert!(result.illegal);
        let spans: Vec<_> = result.tokens.iter().map(|t| (t.category, t.text(src))).collect();
        assert_eq!(
            spans,
            [(Meta, "#"), (Keyword, "include"), (Meta, " "), (TokenCategory::String, "<foo"), (Type, "int")]
        );
    }

    #[test]
    fn test_unterminated_define_string_crlf() {
        let src = "#define S \"abc\r\nint x;";
        let result = highlight(src);
        assert!(result.illegal);
        let spans: Vec<_> = result.tokens.iter().map(|t| (t.category, t.text(src))).collect();
        assert_eq!(
            spans,
            [
                (Meta, "#"),
                (Keyword, "define"),
                (Meta, " S "),
                (TokenCategory::String, "\"abc"),
                (Type, "int"),
            ]
        );
    }

    #[test]
    fn test_shader() {
        let result = highlight(SHADER);
        assert!(!result.illegal);
        assert!(result.relevance > 40, "relevance {}", result.relevance);

        let text = |category| -> Vec<&str> {
            result.tokens_of(category).map(|t| t.text(SHADER)).collect()
        };
        assert_eq!(text(TitleFunction), ["VSMain", "PSMain"]);
        assert_eq!(
            text(Symbol),
            [": POSITION", ": TEXCOORD0", ": SV_Position", ": TEXCOORD0", ": SV_Target"]
        );
        assert_eq!(text(Comment), ["/* Lambert only. */"]);
        assert!(text(Type).contains(&"float4x4"));
        assert!(text(Type).contains(&"SamplerState"));
        assert!(text(BuiltIn).contains(&"mul"));
        assert!(text(BuiltIn).contains(&"Sample"));
    }
}
