use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{ Lead, MessageTemplates };
use crate::providers::{ NewSendRecord, OutreachStore, WhatsAppPayload, WhatsAppRelay };

use super::content_service::{ parse_link, ResolvedContent };
use super::email_service::ChannelReport;

const COUNTRY_CODE: &str = "55";
const FILTER_LINKS_HEADING: &str = "Links dos filtros:";
const DEFAULT_MESSAGE: &str = "Olá! Separamos novos imóveis em leilão para você.";

/// Sends the schedule's WhatsApp message to every lead with a phone,
/// at most once per (phone, link).
#[derive(Clone)]
pub struct WhatsAppService {
    store: Arc<dyn OutreachStore>,
    relay: Arc<dyn WhatsAppRelay>,
    default_catalog_path: String,
    send_delay: Duration,
}

impl WhatsAppService {
    pub fn new(
        store: Arc<dyn OutreachStore>,
        relay: Arc<dyn WhatsAppRelay>,
        default_catalog_path: String,
        send_delay: Duration
    ) -> Self {
        Self {
            store,
            relay,
            default_catalog_path,
            send_delay,
        }
    }

    pub async fn dispatch(
        &self,
        schedule_id: Uuid,
        leads: &[Lead],
        content: &ResolvedContent,
        templates: &MessageTemplates
    ) -> ChannelReport {
        let mut report = ChannelReport::default();

        let template = templates.whatsapp_message.as_deref().unwrap_or(DEFAULT_MESSAGE);
        let message = compose_message(template, &content.filter_urls);
        let mut webhook_calls = 0u32;

        for lead in leads {
            let Some(num) = lead.phone.as_deref().and_then(format_phone) else {
                report.skipped += 1;
                continue;
            };

            let url = lead.filter_config
                .as_deref()
                .and_then(relative_path)
                .unwrap_or_else(|| self.default_catalog_path.clone());

            match self.store.whatsapp_already_sent(&num, &url).await {
                Ok(true) => {
                    tracing::debug!("WhatsApp to {} for {} already sent, skipping", num, url);
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Send history lookup failed for {}: {}", num, e);
                    report.failed += 1;
                    continue;
                }
            }

            if webhook_calls > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            webhook_calls += 1;

            let payload = WhatsAppPayload {
                num: num.clone(),
                url: url.clone(),
                message: Some(message.clone()),
                image: templates.image_url.clone(),
            };

            let response = match self.relay.deliver(content.region, &payload).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("WhatsApp delivery to {} failed: {}", num, e);
                    report.failed += 1;
                    continue;
                }
            };

            report.sent += 1;

            let record = NewSendRecord {
                phone: num.clone(),
                url,
                schedule_id: Some(schedule_id),
                webhook_response: Some(response),
                sent_at: Utc::now(),
            };
            if let Err(e) = self.store.record_whatsapp_send(record).await {
                // Delivered but unrecorded: the next run may send it again
                tracing::error!("Failed to record WhatsApp send to {}: {}", num, e);
            }
        }

        report
    }
}

/// Digits only, with the Brazilian country code. A value without any digit
/// cannot be addressed.
pub fn format_phone(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return None;
    }

    if digits.starts_with(COUNTRY_CODE) && digits.len() >= 12 {
        Some(digits)
    } else {
        Some(format!("{}{}", COUNTRY_CODE, digits))
    }
}

/// Strip scheme and host, keeping path, query and fragment.
pub fn relative_path(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let parsed = parse_link(link)?;
    let mut path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    Some(path)
}

/// Append the audience's filter links unless the template already lists them.
pub fn compose_message(template: &str, filter_urls: &[String]) -> String {
    if filter_urls.is_empty() || template.contains(FILTER_LINKS_HEADING) {
        return template.to_string();
    }

    let links: Vec<String> = filter_urls
        .iter()
        .map(|url| format!("• {}", url))
        .collect();

    format!("{}\n\n{}\n{}", template.trim_end(), FILTER_LINKS_HEADING, links.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Region;
    use crate::testing::{ lead, MemoryStore, RecordingRelay };

    fn content(filter_urls: &[&str]) -> ResolvedContent {
        ResolvedContent {
            property_ids: vec![1],
            region: Region::Sp,
            filter_urls: filter_urls
                .iter()
                .map(|u| u.to_string())
                .collect(),
            resolved_pages: Vec::new(),
            used_fallback: false,
        }
    }

    fn service(store: Arc<MemoryStore>, relay: Arc<RecordingRelay>) -> WhatsAppService {
        WhatsAppService::new(store, relay, "/catalogo".to_string(), Duration::ZERO)
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("(21) 99999-0000"), Some("5521999990000".to_string()));
        assert_eq!(format_phone("+55 11 98888-7777"), Some("5511988887777".to_string()));
        // Area code 55 without the country code
        assert_eq!(format_phone("55 9999-1234"), Some("555599991234".to_string()));
        // Short numbers are passed through for the relay to judge
        assert_eq!(format_phone("999990000"), Some("55999990000".to_string()));
        assert_eq!(format_phone("ramal"), None);
        assert_eq!(format_phone("   "), None);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path("https://leiloes.example.com/catalogo/rj?bairro=tijuca"),
            Some("/catalogo/rj?bairro=tijuca".to_string())
        );
        assert_eq!(relative_path("/filters/abc"), Some("/filters/abc".to_string()));
        assert_eq!(relative_path("catalogo/abc"), Some("/catalogo/abc".to_string()));
        assert_eq!(relative_path(" "), None);
    }

    #[test]
    fn test_compose_message_adds_links_once() {
        let urls = vec!["https://x.com/catalogo/a".to_string()];
        let composed = compose_message("Olá!", &urls);
        assert_eq!(composed, "Olá!\n\nLinks dos filtros:\n• https://x.com/catalogo/a");

        // Already carries the section
        assert_eq!(compose_message(&composed, &urls), composed);
        assert_eq!(compose_message("Olá!", &[]), "Olá!");
    }

    #[tokio::test]
    async fn test_sends_and_records_history() {
        let store = Arc::new(MemoryStore::new());
        let relay = Arc::new(RecordingRelay::default());
        let schedule_id = Uuid::new_v4();

        let leads = vec![
            lead("Ana", None, Some("(21) 99999-0000"), Some("https://x.com/catalogo/rj-1")),
            lead("Bruno", Some("b@example.com"), None, None),
            lead("Carla", None, Some("11 98888-7777"), None)
        ];
        let templates = MessageTemplates {
            whatsapp_message: Some("Novidades!".to_string()),
            image_url: Some("https://cdn.example.com/banner.png".to_string()),
            ..Default::default()
        };

        let report = service(store.clone(), relay.clone()).dispatch(
            schedule_id,
            &leads,
            &content(&["https://x.com/catalogo/rj-1"]),
            &templates
        ).await;
        assert_eq!(report, ChannelReport { sent: 2, failed: 0, skipped: 1 });

        let delivered = relay.delivered.lock().await;
        assert_eq!(delivered[0].0, Region::Sp);
        assert_eq!(delivered[0].1.num, "5521999990000");
        assert_eq!(delivered[0].1.url, "/catalogo/rj-1");
        assert_eq!(delivered[0].1.image.as_deref(), Some("https://cdn.example.com/banner.png"));
        assert!(delivered[0].1.message.as_deref().unwrap().contains("Links dos filtros:"));
        assert_eq!(delivered[1].1.url, "/catalogo");

        let sends = store.sends().await;
        assert_eq!(sends.len(), 2);
        assert_eq!(sends[0].schedule_id, Some(schedule_id));
        assert_eq!(sends[1].phone, "5511988887777");
    }

    #[tokio::test]
    async fn test_skips_already_sent_pairs() {
        let store = Arc::new(MemoryStore::new());
        store.add_send("5521999990000", "/catalogo/rj-1").await;
        let relay = Arc::new(RecordingRelay::default());

        let leads = vec![lead("Ana", None, Some("21999990000"), Some("/catalogo/rj-1"))];
        let svc = service(store.clone(), relay.clone());

        for _ in 0..2 {
            let report = svc.dispatch(
                Uuid::new_v4(),
                &leads,
                &content(&[]),
                &MessageTemplates::default()
            ).await;
            assert_eq!(report, ChannelReport { sent: 0, failed: 0, skipped: 1 });
        }
        assert!(relay.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_resending_delivers_each_pair_once() {
        let store = Arc::new(MemoryStore::new());
        let relay = Arc::new(RecordingRelay::default());
        let leads = vec![lead("Ana", None, Some("21999990000"), Some("/catalogo/rj-1"))];
        let svc = service(store.clone(), relay.clone());

        let first = svc.dispatch(Uuid::new_v4(), &leads, &content(&[]), &MessageTemplates::default()).await;
        let second = svc.dispatch(Uuid::new_v4(), &leads, &content(&[]), &MessageTemplates::default()).await;

        assert_eq!(first.sent, 1);
        assert_eq!(second.sent, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(relay.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_failure_is_isolated_and_not_recorded() {
        let store = Arc::new(MemoryStore::new());
        let mut relay = RecordingRelay::default();
        relay.fail_for.insert("5521999990000".to_string());
        let relay = Arc::new(relay);

        let leads = vec![
            lead("Ana", None, Some("21999990000"), None),
            lead("Bia", None, Some("21977776666"), None)
        ];

        let report = service(store.clone(), relay.clone()).dispatch(
            Uuid::new_v4(),
            &leads,
            &content(&[]),
            &MessageTemplates::default()
        ).await;
        assert_eq!(report, ChannelReport { sent: 1, failed: 1, skipped: 0 });

        let sends = store.sends().await;
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].phone, "5521977776666");
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttles_between_webhook_calls_only() {
        let store = Arc::new(MemoryStore::new());
        store.add_send("5521988880000", "/catalogo").await;
        let relay = Arc::new(RecordingRelay::default());
        let svc = WhatsAppService::new(
            store.clone(),
            relay.clone(),
            "/catalogo".to_string(),
            Duration::from_secs(2)
        );

        let leads = vec![
            lead("Ana", None, Some("21999990000"), None),
            lead("Bia", None, Some("21988880000"), None),
            lead("Caio", None, None, None),
            lead("Davi", None, Some("21977770000"), None),
            lead("Edu", None, Some("21966660000"), None)
        ];

        let started = tokio::time::Instant::now();
        let report = svc.dispatch(
            Uuid::new_v4(),
            &leads,
            &content(&[]),
            &MessageTemplates::default()
        ).await;
        let elapsed = started.elapsed();

        assert_eq!(report, ChannelReport { sent: 3, failed: 0, skipped: 2 });
        // Three webhook calls, two pauses; skips add none
        assert!(elapsed >= Duration::from_secs(4), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6), "elapsed {:?}", elapsed);
    }
}
