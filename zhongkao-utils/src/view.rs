use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppView {
    Landing,
    Vocabulary,
    Cloze,
    NewWords,
    ConfusingDetail,
    Mcq,
    ClozeTest,
    Mimic,
    Settings,
}

impl AppView {
    pub const ALL: [AppView; 9] = [
        AppView::Landing,
        AppView::Vocabulary,
        AppView::Cloze,
        AppView::NewWords,
        AppView::ConfusingDetail,
        AppView::Mcq,
        AppView::ClozeTest,
        AppView::Mimic,
        AppView::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AppView::Landing => "天津中考英语通",
            AppView::Vocabulary => "趣味记单词",
            AppView::Cloze => "首字母填空",
            AppView::NewWords => "生词本",
            AppView::ConfusingDetail => "词义辨析",
            AppView::Mcq => "语法单选题",
            AppView::ClozeTest => "完形填空",
            AppView::Mimic => "模仿朗读",
            AppView::Settings => "AI 服务设置",
        }
    }

    /// Shown while the screen waits on the AI provider. Screens that never
    /// wait have none.
    pub fn loading_text(&self) -> Option<&'static str> {
        match self {
            AppView::Vocabulary => Some("正在联想新单词..."),
            AppView::Cloze => Some("AI 正在生成文章..."),
            AppView::ConfusingDetail => Some("AI 正在查阅文献..."),
            AppView::Mcq => Some("AI 正在出题中..."),
            AppView::ClozeTest => Some("AI 正在构思文章..."),
            AppView::Mimic => Some("AI 正在为你准备短文..."),
            AppView::Landing | AppView::NewWords | AppView::Settings => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ConfusingTarget {
    pub word: String,
    pub snippet: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ViewRouter {
    current: AppView,
    confusing: Option<ConfusingTarget>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self {
            current: AppView::Landing,
            confusing: None,
        }
    }
}

impl ViewRouter {
    pub fn current(&self) -> AppView {
        self.current
    }

    pub fn confusing_target(&self) -> Option<&ConfusingTarget> {
        self.confusing.as_ref()
    }

    /// Switch to a mode. The confusing-words screen needs a target, so it can
    /// only be reached through [`ViewRouter::open_confusing`]; asking for it
    /// here is ignored and returns `false`.
    pub fn select_mode(&mut self, view: AppView) -> bool {
        if view == AppView::ConfusingDetail {
            return false;
        }
        self.current = view;
        true
    }

    pub fn open_confusing(&mut self, word: String, snippet: String) {
        self.confusing = Some(ConfusingTarget { word, snippet });
        self.current = AppView::ConfusingDetail;
    }

    pub fn back(&mut self) -> AppView {
        self.current = match self.current {
            AppView::ConfusingDetail => AppView::Vocabulary,
            _ => AppView::Landing,
        };
        self.current
    }
}
