//! In-memory business data used by the demo tools.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub category: String,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u32,
    pub title: String,
    pub category: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: u32,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct Store {
    tickets: Vec<Ticket>,
    documents: Vec<Document>,
    policies: Vec<Policy>,
    emails: Vec<Email>,
}

/// Canned tickets, runbooks, policies, and emails with a few mutating operations.
#[derive(Debug)]
pub struct MockApi {
    store: Mutex<Store>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(seed()),
        }
    }

    /// An API with no data at all.
    pub fn empty() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open tickets whose title, description, or category mention `query`.
    pub fn search_open_tickets(&self, query: &str) -> Vec<Ticket> {
        let query = query.trim().to_lowercase();
        self.store()
            .tickets
            .iter()
            .filter(|t| t.status == "open")
            .filter(|t| {
                query.is_empty()
                    || t.title.to_lowercase().contains(&query)
                    || t.description.to_lowercase().contains(&query)
                    || t.category.to_lowercase() == query
            })
            .cloned()
            .collect()
    }

    pub fn read_document(&self, doc_id: u32) -> Option<Document> {
        self.store().documents.iter().find(|d| d.id == doc_id).cloned()
    }

    pub fn get_runbook_by_category(&self, category: &str) -> Option<Document> {
        let category = category.trim().to_lowercase();
        self.store()
            .documents
            .iter()
            .find(|d| d.category.as_deref().map(str::to_lowercase).as_deref() == Some(category.as_str()))
            .cloned()
    }

    /// Policies matching any word of `query` in title or content.
    pub fn search_policies(&self, query: &str) -> Vec<Policy> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self.store()
            .policies
            .iter()
            .filter(|p| {
                let haystack = format!("{} {}", p.title, p.content).to_lowercase();
                words.is_empty() || words.iter().any(|w| haystack.contains(w.as_str()))
            })
            .cloned()
            .collect()
    }

    pub fn get_emails(&self, to: Option<&str>) -> Vec<Email> {
        self.store()
            .emails
            .iter()
            .filter(|e| to.map_or(true, |to| e.to.eq_ignore_ascii_case(to)))
            .cloned()
            .collect()
    }

    /// Append a comment; `None` when the ticket does not exist.
    pub fn add_ticket_comment(&self, ticket_id: u32, comment: &str) -> Option<Vec<String>> {
        let mut store = self.store();
        let ticket = store.tickets.iter_mut().find(|t| t.id == ticket_id)?;
        ticket.comments.push(comment.to_string());
        Some(ticket.comments.clone())
    }

    /// Update the document with `doc_id`, or create a new one.
    pub fn write_document(&self, title: &str, content: &str, doc_id: Option<u32>) -> Document {
        let mut store = self.store();
        if let Some(existing) = doc_id.and_then(|id| store.documents.iter_mut().find(|d| d.id == id)) {
            existing.title = title.to_string();
            existing.content = content.to_string();
            return existing.clone();
        }
        let id = doc_id.unwrap_or_else(|| store.documents.iter().map(|d| d.id).max().unwrap_or(0) + 1);
        let doc = Document {
            id,
            title: title.to_string(),
            category: None,
            content: content.to_string(),
        };
        store.documents.push(doc.clone());
        doc
    }

    pub fn send_email(&self, from: &str, to: &str, subject: &str, body: &str) -> Email {
        let mut store = self.store();
        let email = Email {
            id: store.emails.iter().map(|e| e.id).max().unwrap_or(0) + 1,
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        store.emails.push(email.clone());
        email
    }
}

fn seed() -> Store {
    let ticket = |id, title: &str, description: &str, status: &str, category: &str| Ticket {
        id,
        title: title.to_string(),
        description: description.to_string(),
        status: status.to_string(),
        category: category.to_string(),
        comments: Vec::new(),
    };
    let document = |id, title: &str, category: &str, content: &str| Document {
        id,
        title: title.to_string(),
        category: Some(category.to_string()),
        content: content.to_string(),
    };
    let policy = |id, title: &str, content: &str| Policy {
        id,
        title: title.to_string(),
        content: content.to_string(),
    };
    let email = |id, from: &str, to: &str, subject: &str, body: &str| Email {
        id,
        from: from.to_string(),
        to: to.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
    };

    Store {
        tickets: vec![
            ticket(1, "VPN drops every hour", "Remote staff lose VPN connectivity hourly.", "open", "network"),
            ticket(2, "Printer on floor 3 jammed", "Paper jam error persists after reset.", "open", "hardware"),
            ticket(3, "Password reset loop", "SSO keeps asking for a new password.", "open", "access"),
            ticket(4, "Laptop battery swelling", "Replaced under warranty.", "closed", "hardware"),
        ],
        documents: vec![
            document(1, "Network Outage Runbook", "network", "1. Check the status page. 2. Restart the VPN concentrator. 3. Escalate to on-call."),
            document(2, "Hardware Triage Runbook", "hardware", "1. Power cycle. 2. Check warranty. 3. Open a vendor case."),
            document(3, "Access Issues Runbook", "access", "1. Verify identity. 2. Clear SSO sessions. 3. Reset MFA if needed."),
        ],
        policies: vec![
            policy(1, "Travel Policy", "Economy class for flights under six hours; book through the portal."),
            policy(2, "Remote Work Policy", "Employees may work remotely up to three days per week with manager approval."),
            policy(3, "Expense Policy", "Submit receipts within 30 days; meals are capped at 50 per day."),
        ],
        emails: vec![
            email(1, "it@example.com", "alice@example.com", "VPN maintenance tonight", "The VPN will be down from 22:00 to 23:00."),
            email(2, "hr@example.com", "bob@example.com", "Remote work approval", "Your remote work request was approved."),
            email(3, "finance@example.com", "alice@example.com", "Expense report reminder", "Please submit your Q3 expenses."),
        ],
    }
}
