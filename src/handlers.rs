use tracing::{debug, error, info};

use crate::content::{ContentSource, PageNumber};
use crate::platform::Outbound;

pub const WELCOME_TEXT: &str = "🌙 مرحبًا بك في بوت القرآن والسنة\n\n\
📖 أرسل رقم صفحة (1 – 604) لعرض صفحة من المصحف\n\n\
🕋 أرسل الأمر:\n\
/hadith\n\
للحصول على حديث نبوي عشوائي";

pub const HADITH_APOLOGY_TEXT: &str = "⚠️ تعذر جلب حديث حاليًا، حاول مرة أخرى لاحقًا";

pub const PAGE_APOLOGY_TEXT: &str = "⚠️ حدث خطأ أثناء جلب الصفحة";

pub const PAGE_RANGE_TEXT: &str = "❌ رقم الصفحة يجب أن يكون بين 1 و 604";

pub const FALLBACK_TEXT: &str = "ℹ️ أرسل رقم صفحة أو استخدم /hadith";

pub fn page_caption(page: PageNumber) -> String {
    format!("📖 صفحة رقم {}", page)
}

pub fn welcome() -> Outbound {
    Outbound::Text(WELCOME_TEXT.to_string())
}

pub async fn random_hadith(content: &dyn ContentSource) -> Outbound {
    match content.random_hadith().await {
        Ok(hadith) => {
            info!("Sending hadith from {}", hadith.collection);
            Outbound::Text(format!(
                "🕋 حديث نبوي\n📚 المصدر: {}\n\n{}",
                hadith.collection, hadith.text
            ))
        }
        Err(e) => {
            error!("Hadith fetch failed: {}", e);
            Outbound::Text(HADITH_APOLOGY_TEXT.to_string())
        }
    }
}

/// Send mushaf page `requested`, or a range error without fetching.
pub async fn page(content: &dyn ContentSource, requested: i64) -> Outbound {
    let page = match PageNumber::new(requested) {
        Ok(page) => page,
        Err(e) => {
            debug!("Rejected page request: {}", e);
            return Outbound::Reply(PAGE_RANGE_TEXT.to_string());
        }
    };

    match content.page_image(page).await {
        Ok(image) => {
            info!("Sending page {} ({} bytes)", page, image.len());
            Outbound::Photo {
                image,
                caption: page_caption(page),
            }
        }
        Err(e) => {
            error!("Page {} fetch failed: {}", page, e);
            Outbound::Reply(PAGE_APOLOGY_TEXT.to_string())
        }
    }
}

pub fn fallback() -> Outbound {
    Outbound::Text(FALLBACK_TEXT.to_string())
}
