use serde::Serialize;
use serde::ser::SerializeMap;
use std::fmt;
use std::str::FromStr;

/// 线稿风格。标识符是对外契约的一部分，不可更改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    ComicBook,
    Sketch,
    ChildrensCartoon,
    BasicOutline,
    Caricature,
}

impl Style {
    /// 全部风格，顺序即对外展示顺序
    pub const ALL: [Style; 5] = [
        Style::ComicBook,
        Style::Sketch,
        Style::ChildrensCartoon,
        Style::BasicOutline,
        Style::Caricature,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Style::ComicBook => "comic-book",
            Style::Sketch => "sketch",
            Style::ChildrensCartoon => "childrens-cartoon",
            Style::BasicOutline => "basic-outline",
            Style::Caricature => "caricature",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Style::ComicBook => "Comic Book Style",
            Style::Sketch => "Sketch Style",
            Style::ChildrensCartoon => "Children's Cartoon Style",
            Style::BasicOutline => "Photo Outline Style",
            Style::Caricature => "Caricature Style",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Style::ComicBook => "Bold lines, stylized shadows, dynamic expressions",
            Style::Sketch => "Refined, hand-drawn pencil-like detailing",
            Style::ChildrensCartoon => "Soft, rounded features and playful charm",
            Style::BasicOutline => "Simplified black-and-white outline of the actual photo",
            Style::Caricature => "Whimsical, bouncy line art with exaggerated character",
        }
    }

    /// 发送给生成服务的完整指令
    pub const fn prompt(self) -> &'static str {
        match self {
            Style::ComicBook => {
                "Use the reference image to create a black and white image for a coloring book in this style: Comic Book Style – Bold lines, stylized shadows, dynamic expressions"
            }
            Style::Sketch => {
                "Use the reference image to create a black and white image for a coloring book in this style: Sketch Style – Refined, hand-drawn pencil-like detailing"
            }
            Style::ChildrensCartoon => {
                "Use the reference image to create a black and white image for a coloring book in this style: Children's Cartoon Style – Soft, rounded features and playful charm"
            }
            Style::BasicOutline => {
                "Use the reference image to create a black and white image for a coloring book in this style: Photo Outline Style – Simplified black-and-white outline of the actual photo"
            }
            Style::Caricature => {
                "Use the reference image to create a black and white image for a coloring book in this style: Caricature Style – Whimsical, bouncy line art with exaggerated character"
            }
        }
    }

    /// 逗号分隔的全部标识符，用于错误提示
    pub fn options_list() -> String {
        Style::ALL.map(Style::id).join(", ")
    }

    /// 压缩包下载名，例如 `ColoringBook_comic_book.zip`
    pub fn archive_filename(self) -> String {
        format!("ColoringBook_{}.zip", self.id().replace('-', "_"))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 未知的风格标识符
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style `{0}`")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.id() == s)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// `/prompts` 中单个风格的展示信息
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StyleInfo {
    #[schema(example = "Sketch Style")]
    pub name: &'static str,
    #[schema(example = "Refined, hand-drawn pencil-like detailing")]
    pub description: &'static str,
}

impl From<Style> for StyleInfo {
    fn from(style: Style) -> Self {
        Self {
            name: style.name(),
            description: style.description(),
        }
    }
}

/// 风格目录：序列化为 `{id: {name, description}}`，键顺序与 [`Style::ALL`] 一致。
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptCatalog;

impl Serialize for PromptCatalog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Style::ALL.len()))?;
        for style in Style::ALL {
            map.serialize_entry(style.id(), &StyleInfo::from(style))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_id() {
        for style in Style::ALL {
            assert_eq!(style.id().parse::<Style>(), Ok(style));
        }
    }

    #[test]
    fn rejects_unknown_and_case_variants() {
        assert!("watercolor".parse::<Style>().is_err());
        assert!("Sketch".parse::<Style>().is_err());
        assert!(" sketch".parse::<Style>().is_err());
    }

    #[test]
    fn prompt_embeds_name_and_description() {
        for style in Style::ALL {
            let prompt = style.prompt();
            assert!(prompt.starts_with("Use the reference image to create a black and white image"));
            assert!(prompt.ends_with(&format!("{} – {}", style.name(), style.description())));
        }
    }

    #[test]
    fn archive_filename_replaces_dashes() {
        assert_eq!(
            Style::ChildrensCartoon.archive_filename(),
            "ColoringBook_childrens_cartoon.zip"
        );
        assert_eq!(Style::Sketch.archive_filename(), "ColoringBook_sketch.zip");
    }

    #[test]
    fn catalog_serializes_in_display_order() {
        let text = serde_json::to_string(&PromptCatalog).expect("serialize catalog");
        let positions: Vec<usize> = Style::ALL
            .iter()
            .map(|s| text.find(&format!("\"{}\"", s.id())).expect("id present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }
}
