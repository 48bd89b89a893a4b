//! Fixed reply wording, one table per profile and mode.

use setu_core::{RequestMode, TriggerProfile};

/// Every string the pipeline can say, keyed by step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTable {
    /// Sent as soon as a trigger matches.
    pub ack: &'static str,
    pub no_data: &'static str,
    pub no_url: &'static str,
    pub save_failed: &'static str,
    pub success: &'static str,
    /// Image went out but the local copy could not be removed.
    pub cleanup_failed: &'static str,
    pub send_failed: &'static str,
    pub generic: &'static str,
}

const CLASSIC_ADULT: ReplyTable = ReplyTable {
    ack: "皇上又来了 喵",
    no_data: "皇上不行了 喵",
    no_url: "皇上没戴那个 喵",
    save_failed: "皇上不能内射 喵",
    success: "啊 出来了 喵",
    cleanup_failed: "完了涩涩没有打扫干净",
    send_failed: "皇上我处理不好 喵",
    generic: "处理请求时发生错误，请联系管理员",
};

const CLASSIC_FILTERED: ReplyTable = ReplyTable {
    ack: "好的，为您准备健康的内容~",
    no_data: "暂时没有健康内容可以提供哦",
    no_url: "获取健康内容链接失败",
    save_failed: "保存健康内容时出现问题",
    success: "这是您要的健康内容哦~",
    cleanup_failed: "内容已处理，但清理时出现问题。",
    send_failed: "网络不佳，健康内容没送达到。",
    generic: "获取内容时出错啦，请稍后再试~",
};

const QUALIFIER_ADULT: ReplyTable = ReplyTable {
    ack: "收到 喵，这就去翻箱底",
    no_data: "箱底空空的 喵",
    no_url: "找到了但是打不开 喵",
    save_failed: "图片搬不动了 喵",
    success: "请慢用 喵",
    cleanup_failed: "图发了，但是现场没收拾干净",
    send_failed: "图片送不出去 喵",
    generic: "出了点问题，请联系管理员",
};

const QUALIFIER_FILTERED: ReplyTable = ReplyTable {
    ack: "收到，这就去找健康的图~",
    no_data: "暂时没有找到健康的图哦",
    no_url: "健康的图链接失效了",
    save_failed: "健康的图没能保存下来",
    success: "健康的图来啦~",
    cleanup_failed: "图已送达，但清理时出现问题。",
    send_failed: "网络不佳，健康的图没送达。",
    generic: "找图时出错啦，请稍后再试~",
};

impl ReplyTable {
    pub fn for_mode(profile: TriggerProfile, mode: RequestMode) -> &'static ReplyTable {
        match (profile, mode) {
            (TriggerProfile::Classic, RequestMode::Adult) => &CLASSIC_ADULT,
            (TriggerProfile::Classic, RequestMode::Filtered) => &CLASSIC_FILTERED,
            (TriggerProfile::Qualifier, RequestMode::Adult) => &QUALIFIER_ADULT,
            (TriggerProfile::Qualifier, RequestMode::Filtered) => &QUALIFIER_FILTERED,
        }
    }
}

/// Returned when the acknowledgement itself cannot be delivered.
pub fn plugin_failure(err: &dyn std::fmt::Display) -> String {
    format!("插件异常: {}", err)
}
