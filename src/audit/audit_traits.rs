/// Fire-and-forget audit logging. Implementations must never let a logging
/// failure affect the financial mutation that triggered it.
pub trait AuditSink: Send + Sync {
    fn log(&self, actor: &str, action: &str);
}
