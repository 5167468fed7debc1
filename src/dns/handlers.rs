use crate::error::Error;
use crate::zone::{Responder, Zones};
use lazy_static::lazy_static;
use std::sync::Arc;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::error;
use trust_dns_proto::rr::rdata::SOA;
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::client::op::{Header, MessageType, OpCode, ResponseCode};
use trust_dns_server::client::rr::{RData, Record, RecordType};
use trust_dns_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

/// TTL of synthesized SOA records.
const SOA_TTL: u32 = 604_800;

#[derive(Clone)]
pub struct Handler {
    zones: Arc<Zones>,
}

lazy_static! {
    static ref SERIAL_FORMATTER: &'static [time::format_description::FormatItem<'static>] =
        format_description!(version = 2, "[year][month][day]");
}

/// Keep the records of the queried type, or all of them for `ANY` queries.
pub(crate) fn filter_records(records: Vec<Record>, query_type: RecordType) -> Vec<Record> {
    if query_type == RecordType::ANY {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.record_type() == query_type)
        .collect()
}

/// The SOA record data of a zone, with a serial based on today's date.
pub(crate) fn soa_rdata(responder: &Responder) -> RData {
    // NB: unwraps are safe: known date format producing values that will always parse as u32.
    let serial: u32 = OffsetDateTime::now_utc()
        .format(&SERIAL_FORMATTER)
        .unwrap()
        .parse()
        .unwrap();
    let apex = responder.apex();
    // See RIPE 203[0] for recommended values.
    // [0]: https://www.ripe.net/publications/docs/ripe-203
    RData::SOA(SOA::new(
        apex.ns_domain.clone().into(),
        apex.ns_admin.clone(),
        serial,
        86_400,    // 24 hrs.
        7_200,     // 2 hours.
        3_600_000, // 1000 hours.
        172_800,   // 2 days.
    ))
}

impl Handler {
    pub(super) fn new(zones: Arc<Zones>) -> Self {
        Handler { zones }
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response: R,
    ) -> Result<ResponseInfo, Error> {
        // If it isn't a query, return NOTIMPL.
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return self.handle_notimpl(request, response).await;
        }

        // Names outside of every zone aren't ours to answer.
        let Some(responder) = self.zones.find(request.query().name()) else {
            return self.send_refused(request, response).await;
        };

        match request.query().query_type() {
            RecordType::SOA if *request.query().name() == responder.apex().domain => {
                self.handle_request_soa(request, response, responder).await
            }
            _ => self.handle_request_records(request, response, responder).await,
        }
    }

    async fn handle_notimpl<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let response = MessageResponseBuilder::from_message_request(request);
        Ok(response_handle
            .send_response(response.error_msg(request.header(), ResponseCode::NotImp))
            .await?)
    }

    async fn handle_request_soa<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
        responder: &Responder,
    ) -> Result<ResponseInfo, Error> {
        let soa = Record::from_rdata(
            request.query().name().into(),
            SOA_TTL,
            soa_rdata(responder),
        );
        self.send_auth_resp(request, response_handle, vec![soa])
            .await
    }

    async fn handle_request_records<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
        responder: &Responder,
    ) -> Result<ResponseInfo, Error> {
        let records = responder.resolve(request.query().name()).await;
        if records.is_empty() {
            return self
                .send_negative(request, response_handle, responder, ResponseCode::NXDomain)
                .await;
        }
        // The name exists, answer without records if it has none of the queried type.
        let records = filter_records(records, request.query().query_type());
        if records.is_empty() {
            return self
                .send_negative(request, response_handle, responder, ResponseCode::NoError)
                .await;
        }
        self.send_auth_resp(request, response_handle, records)
            .await
    }

    async fn send_auth_resp<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        records: Vec<Record>,
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, records.iter(), &[], &[], &[]);
        Ok(response_handle.send_response(response).await?)
    }

    /// NXDOMAIN or NODATA, with the zone SOA in the authority section so resolvers can cache
    /// the negative answer (RFC 2308).
    async fn send_negative<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        responder: &Responder,
        code: ResponseCode,
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_response_code(code);
        let soa = [Record::from_rdata(
            responder.apex().domain.clone().into(),
            SOA_TTL,
            soa_rdata(responder),
        )];
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, &[], &[], &soa, &[]);
        Ok(response_handle.send_response(response).await?)
    }

    async fn send_refused<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        self.send_code(request, response_handle, ResponseCode::Refused)
            .await
    }

    async fn send_code<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        code: ResponseCode,
    ) -> Result<ResponseInfo, Error> {
        let builder = MessageResponseBuilder::from_message_request(request);
        let mut header = Header::response_from_request(request.header());
        header.set_response_code(code);
        let response = builder.build_no_records(header);
        Ok(response_handle.send_response(response).await?)
    }
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{registry, WORDS};
    use crate::slot_store::InMemorySlotStore;
    use crate::zone::tests::{apex, lower};
    use crate::zone::{EchoResponder, WordsResponder};
    use std::io;
    use std::net::IpAddr;
    use std::str::FromStr;
    use std::sync::Mutex;
    use trust_dns_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
    use trust_dns_server::authority::{MessageRequest, MessageResponse};
    use trust_dns_server::client::op::{Message, Query};
    use trust_dns_server::client::rr::Name;
    use trust_dns_server::server::Protocol;

    /// Keeps the last response sent through it, encoded as it would go on the wire.
    #[derive(Clone, Default)]
    struct CapturedResponse(Arc<Mutex<Vec<u8>>>);

    impl CapturedResponse {
        fn message(&self) -> Message {
            Message::from_vec(&self.0.lock().unwrap()).unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ResponseHandler for CapturedResponse {
        async fn send_response<'a>(
            &mut self,
            response: MessageResponse<
                '_,
                'a,
                impl Iterator<Item = &'a Record> + Send + 'a,
                impl Iterator<Item = &'a Record> + Send + 'a,
                impl Iterator<Item = &'a Record> + Send + 'a,
                impl Iterator<Item = &'a Record> + Send + 'a,
            >,
        ) -> io::Result<ResponseInfo> {
            let mut buf = self.0.lock().unwrap();
            buf.clear();
            let mut encoder = BinEncoder::new(&mut buf);
            Ok(response.destructive_emit(&mut encoder).unwrap())
        }
    }

    fn request(name: &str, query_type: RecordType, op_code: OpCode) -> Request {
        let mut message = Message::new();
        message
            .set_id(7)
            .set_message_type(MessageType::Query)
            .set_op_code(op_code)
            .add_query(Query::query(Name::from_str(name).unwrap(), query_type));
        let bytes = message.to_vec().unwrap();
        let message = MessageRequest::from_bytes(&bytes).unwrap();
        Request::new(message, "192.0.2.1:5353".parse().unwrap(), Protocol::Udp)
    }

    fn echo_handler() -> Handler {
        let echo = Responder::Echo(EchoResponder::new(apex("echo.example.")));
        Handler::new(Arc::new(Zones::new(vec![echo])))
    }

    async fn answer(handler: &Handler, name: &str, query_type: RecordType) -> Message {
        let captured = CapturedResponse::default();
        handler
            .handle_request(&request(name, query_type, OpCode::Query), captured.clone())
            .await;
        captured.message()
    }

    fn assert_negative(message: &Message, code: ResponseCode, zone: &str) {
        assert_eq!(message.response_code(), code);
        assert!(message.authoritative());
        assert!(message.answers().is_empty());
        assert_eq!(message.name_servers().len(), 1);
        let soa = &message.name_servers()[0];
        assert_eq!(soa.record_type(), RecordType::SOA);
        assert_eq!(*soa.name(), Name::from_str(zone).unwrap());
    }

    #[tokio::test]
    async fn answers_echo_addresses() {
        let message = answer(&echo_handler(), "192.0.2.7.echo.example.", RecordType::A).await;
        assert_eq!(message.id(), 7);
        assert_eq!(message.response_code(), ResponseCode::NoError);
        assert!(message.authoritative());
        assert_eq!(message.answers().len(), 1);
        assert_eq!(
            message.answers()[0].data(),
            Some(&RData::A("192.0.2.7".parse().unwrap()))
        );
    }

    #[tokio::test]
    async fn names_outside_every_zone_are_refused() {
        let message = answer(&echo_handler(), "192.0.2.7.example.org.", RecordType::A).await;
        assert_eq!(message.response_code(), ResponseCode::Refused);
        assert!(!message.authoritative());
        assert!(message.answers().is_empty());
    }

    #[tokio::test]
    async fn only_queries_are_implemented() {
        let captured = CapturedResponse::default();
        let notify = request("echo.example.", RecordType::SOA, OpCode::Notify);
        echo_handler()
            .handle_request(&notify, captured.clone())
            .await;
        let message = captured.message();
        assert_eq!(message.response_code(), ResponseCode::NotImp);
        assert!(message.answers().is_empty());
    }

    #[tokio::test]
    async fn unknown_names_are_nxdomain() {
        let message = answer(&echo_handler(), "nope.echo.example.", RecordType::A).await;
        assert_negative(&message, ResponseCode::NXDomain, "echo.example.");
    }

    #[tokio::test]
    async fn missing_record_types_are_nodata() {
        let handler = echo_handler();
        let message = answer(&handler, "192.0.2.7.echo.example.", RecordType::AAAA).await;
        assert_negative(&message, ResponseCode::NoError, "echo.example.");

        // The apex only has NS and AAAA records.
        let message = answer(&handler, "echo.example.", RecordType::A).await;
        assert_negative(&message, ResponseCode::NoError, "echo.example.");
    }

    #[tokio::test]
    async fn apex_soa_is_authoritative() {
        let message = answer(&echo_handler(), "Echo.Example.", RecordType::SOA).await;
        assert_eq!(message.response_code(), ResponseCode::NoError);
        assert!(message.authoritative());
        assert_eq!(message.answers().len(), 1);
        assert_eq!(message.answers()[0].record_type(), RecordType::SOA);

        // Below the apex, SOA queries get the negative answer of any other missing type.
        let message = answer(&echo_handler(), "192.0.2.7.echo.example.", RecordType::SOA).await;
        assert_negative(&message, ResponseCode::NoError, "echo.example.");
    }

    #[tokio::test]
    async fn answers_registered_names() {
        let registry = Arc::new(registry(Arc::new(InMemorySlotStore::default()), WORDS, 3));
        let zone = lower("words.example.");
        let addr: IpAddr = "2001:db8::9".parse().unwrap();
        let name = registry.assign_or_confirm(&zone, addr).await.unwrap();
        let words = Responder::Words(WordsResponder::new(apex("words.example."), registry));
        let handler = Handler::new(Arc::new(Zones::new(vec![words])));

        let fqdn = format!("{name}.words.example.");
        let message = answer(&handler, &fqdn, RecordType::AAAA).await;
        assert_eq!(message.response_code(), ResponseCode::NoError);
        assert_eq!(message.answers().len(), 1);
        assert_eq!(
            message.answers()[0].data(),
            Some(&RData::AAAA("2001:db8::9".parse().unwrap()))
        );

        let message = answer(&handler, "nope-nope-nope.words.example.", RecordType::AAAA).await;
        assert_negative(&message, ResponseCode::NXDomain, "words.example.");
    }

    #[test]
    fn filters_by_query_type() {
        let responder = EchoResponder::new(apex("echo.example."));
        let records = responder.resolve(&lower("echo.example."));
        assert_eq!(records.len(), 2);

        let ns = filter_records(records.clone(), RecordType::NS);
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].record_type(), RecordType::NS);
        assert!(filter_records(records.clone(), RecordType::A).is_empty());
        assert_eq!(filter_records(records, RecordType::ANY).len(), 2);
    }

    #[test]
    fn soa_names_the_nameserver() {
        let responder = Responder::Echo(EchoResponder::new(apex("echo.example.")));
        match soa_rdata(&responder) {
            RData::SOA(soa) => {
                assert_eq!(*soa.mname(), Name::from(&lower("ns.example.")));
                assert_eq!(*soa.rname(), responder.apex().ns_admin);
                assert_eq!(soa.refresh(), 86_400);
                assert!(soa.serial() > 20_000_000);
            }
            other => panic!("expected SOA, got {other:?}"),
        }
    }
}
