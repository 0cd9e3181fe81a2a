use crate::foundation::core::ElementId;

/// Inline style properties the engine overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProp {
    Width,
    MaxWidth,
    MaxHeight,
    MarginLeft,
    Opacity,
    FlexGrow,
    /// `--hero-natural-w` custom property.
    HeroNaturalWidth,
}

impl StyleProp {
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::MaxWidth => "max-width",
            Self::MaxHeight => "max-height",
            Self::MarginLeft => "margin-left",
            Self::Opacity => "opacity",
            Self::FlexGrow => "flex-grow",
            Self::HeroNaturalWidth => "--hero-natural-w",
        }
    }
}

/// Classes the engine toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassName {
    Visible,
    Expanded,
    Active,
    AtEnd,
}

impl ClassName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Expanded => "expanded",
            Self::Active => "active",
            Self::AtEnd => "at-end",
        }
    }
}

/// One DOM mutation for the host to apply, in emission order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomPatch {
    SetStyle {
        target: ElementId,
        prop: StyleProp,
        value: String,
        important: bool,
    },
    RemoveStyle {
        target: ElementId,
        prop: StyleProp,
    },
    /// Drop every inline style on the element.
    ClearStyle {
        target: ElementId,
    },
    SetClass {
        target: ElementId,
        class: ClassName,
        on: bool,
    },
    /// Replace (never push) the URL fragment; `None` strips it.
    ReplaceHash {
        hash: Option<String>,
    },
    ScrollTo {
        top: f64,
        smooth: bool,
    },
}

impl DomPatch {
    pub fn px(target: ElementId, prop: StyleProp, px: f64, important: bool) -> Self {
        Self::SetStyle {
            target,
            prop,
            value: format!("{px}px"),
            important,
        }
    }

    pub fn style(target: ElementId, prop: StyleProp, value: &str, important: bool) -> Self {
        Self::SetStyle {
            target,
            prop,
            value: value.to_string(),
            important,
        }
    }

    pub fn remove(target: ElementId, prop: StyleProp) -> Self {
        Self::RemoveStyle { target, prop }
    }

    pub fn class(target: ElementId, class: ClassName, on: bool) -> Self {
        Self::SetClass { target, class, on }
    }
}
