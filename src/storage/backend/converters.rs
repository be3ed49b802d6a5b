use crate::storage::Link;
use migration::entities::short_link;

/// 将 Sea-ORM Model 转换为 Link
pub fn model_to_link(model: short_link::Model) -> Link {
    Link {
        code: model.short_code,
        target: model.target_url,
        created_at: model.created_at,
        clicks: model.click_count.max(0) as u64,
    }
}

/// 将新建的 Link 转换为 ActiveModel
pub fn link_to_active_model(link: &Link) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_link::ActiveModel {
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        created_at: Set(link.created_at),
        click_count: Set(i64::try_from(link.clicks).unwrap_or(i64::MAX)),
    }
}
